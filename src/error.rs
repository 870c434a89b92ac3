use thiserror::Error;

/// Failure of a register or unregister call.
///
/// Every variant means the call had no effect. Nothing is retried
/// internally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HookError {
    /// A null (`None`) callback was supplied
    #[error("invalid argument: hook callback is null")]
    InvalidArgument,

    /// The callback is already registered on this direction
    #[error("hook already registered")]
    AlreadyExists,

    /// The callback is not registered on this direction
    #[error("hook not registered")]
    NotFound,

    /// The hook list could not grow
    #[error("out of memory while registering hook")]
    OutOfMemory,
}

impl HookError {
    /// Negative errno value a C caller would see for this error.
    pub fn errno(self) -> i32 {
        match self {
            HookError::InvalidArgument => -22, // EINVAL
            HookError::AlreadyExists => -17,   // EEXIST
            HookError::NotFound => -2,         // ENOENT
            HookError::OutOfMemory => -12,     // ENOMEM
        }
    }
}

#[derive(Debug, Error)]
pub enum SkbHookError {
    /// Error from a hook registry operation
    #[error("Hook registry error: {0}")]
    Hook(#[from] HookError),

    /// I/O errors from file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Failed to parse settings: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Report could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings parsed but are not usable
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Ctrl-C handler could not be installed
    #[error("Failed to install signal handler: {0}")]
    Signal(String),

    /// A worker thread panicked
    #[error("Worker thread '{0}' panicked")]
    ThreadPanicked(String),
}

/// A convenient Result type alias using `SkbHookError`.
pub type Result<T> = std::result::Result<T, SkbHookError>;

impl SkbHookError {
    /// Creates an invalid settings error for `field`.
    pub fn invalid_setting(field: &str, reason: &str) -> Self {
        Self::InvalidSettings(format!("{}: {}", field, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(HookError::InvalidArgument.errno(), -22);
        assert_eq!(HookError::AlreadyExists.errno(), -17);
        assert_eq!(HookError::NotFound.errno(), -2);
        assert_eq!(HookError::OutOfMemory.errno(), -12);
    }

    #[test]
    fn test_hook_error_converts() {
        let err: SkbHookError = HookError::NotFound.into();
        assert_eq!(err.to_string(), "Hook registry error: hook not registered");
    }

    #[test]
    fn test_invalid_setting_message() {
        let err = SkbHookError::invalid_setting("traffic.rx_share", "must be within 0.0..=1.0");
        assert_eq!(
            err.to_string(),
            "Invalid settings: traffic.rx_share: must be within 0.0..=1.0"
        );
    }
}
