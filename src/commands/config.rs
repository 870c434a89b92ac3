use crate::error::{Result, SkbHookError};
use crate::settings::file::{default_config_path, load_settings, save_settings};
use crate::settings::Settings;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves `path`, falling back to the per-user default location.
pub fn config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path().ok_or_else(|| {
            SkbHookError::invalid_setting("config", "no per-user config directory on this platform")
        }),
    }
}

/// Writes a settings file populated with defaults.
///
/// # Returns
///
/// * `Ok(path)` - Where the file was written
/// * `Err(_)` - If the file exists and `force` is not set, or writing failed
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = config_path(path)?;

    if path.exists() && !force {
        return Err(SkbHookError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )));
    }

    save_settings(&path, &Settings::default())?;
    Ok(path)
}

/// Settings a run would use.
///
/// An explicit file wins over `flags`. `Some(None)` means the default file
/// location.
pub fn resolve_settings(config: Option<Option<&Path>>, flags: Settings) -> Result<Settings> {
    match config {
        Some(path) => {
            let path = config_path(path)?;
            load_settings(&path)
        }
        None => {
            flags.validate()?;
            Ok(flags)
        }
    }
}

/// Effective settings as TOML.
///
/// Reads `path` (or the default file when it exists); otherwise renders the
/// built-in defaults.
pub fn show_config(path: Option<&Path>) -> Result<String> {
    let settings = match path {
        Some(path) => load_settings(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => load_settings(&path)?,
            None => {
                info!("No settings file found, showing defaults");
                Settings::default()
            }
        },
    };

    Ok(toml::to_string_pretty(&settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skbhook-cmd-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("skbhook.toml")
    }

    #[test]
    fn test_init_config_writes_defaults() {
        let path = temp_file("init");

        let written = init_config(Some(&path), false).unwrap();
        assert_eq!(written, path);
        assert_eq!(load_settings(&path).unwrap(), Settings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let path = temp_file("exists");
        init_config(Some(&path), false).unwrap();

        let err = init_config(Some(&path), false).unwrap_err();
        assert!(matches!(err, SkbHookError::Io(ref e) if e.kind() == io::ErrorKind::AlreadyExists));
        assert!(init_config(Some(&path), true).is_ok());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_resolve_prefers_file() {
        let path = temp_file("resolve");
        let on_disk = Settings::builder().packets(42).build();
        save_settings(&path, &on_disk).unwrap();

        let flags = Settings::builder().packets(7).build();
        let resolved = resolve_settings(Some(Some(path.as_path())), flags.clone()).unwrap();
        assert_eq!(resolved.traffic.packets, 42);

        let resolved = resolve_settings(None, flags).unwrap();
        assert_eq!(resolved.traffic.packets, 7);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_resolve_validates_flags() {
        let flags = Settings::builder().capacity(0).build();
        assert!(resolve_settings(None, flags).is_err());
    }

    #[test]
    fn test_show_config_renders_file() {
        let path = temp_file("show");
        save_settings(&path, &Settings::builder().seed(5).build()).unwrap();

        let rendered = show_config(Some(&path)).unwrap();
        assert!(rendered.contains("seed = 5"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
