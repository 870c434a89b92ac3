//! The `run` command.
//!
//! Builds a registry and a driver around it, attaches the configured
//! observers, then pushes synthetic traffic through the RX and TX paths
//! from separate threads. An optional churn thread keeps registering and
//! unregistering a probe hook while traffic flows, exercising the registry
//! under concurrent mutation.

use crate::error::{Result, SkbHookError};
use crate::hooks::{Direction, HookContext, HookStatisticsSnapshot};
use crate::network::core::SxDevice;
use crate::network::observers::{
    count_packet, histogram_packet, probe_packet, PacketCounter, SizeHistogram,
    SizeHistogramSnapshot,
};
use crate::network::{DriverCounters, SkbHookFn, SkbHookRegistry, SxDriver, TrafficGenerator};
use crate::settings::{ObserverOptions, Settings, TrafficOptions};
use crate::utils::{log_hook_statistics, log_statistics};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Observer totals for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTraffic {
    pub packets: u64,
    pub bytes: u64,
}

/// What the churn worker did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub registered: u64,
    pub unregistered: u64,
    pub rejected: u64,
    /// Packets seen by the probe hook while it was attached
    pub probe_hits: u64,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub device: String,
    pub elapsed_ms: u64,
    pub interrupted: bool,
    pub driver: DriverCounters,
    pub hooks: HookStatisticsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_rx: Option<ObservedTraffic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_tx: Option<ObservedTraffic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<SizeHistogramSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn: Option<ChurnReport>,
}

/// Observer state owned by the run.
///
/// Hooks point at these through their contexts, so the values must not be
/// dropped before [`Observers::detach`] has run.
struct Observers {
    rx_counter: PacketCounter,
    tx_counter: PacketCounter,
    histogram: SizeHistogram,
    attached: Vec<(Direction, SkbHookFn)>,
}

impl Observers {
    fn new() -> Self {
        Self {
            rx_counter: PacketCounter::new(),
            tx_counter: PacketCounter::new(),
            histogram: SizeHistogram::new(),
            attached: Vec::new(),
        }
    }

    /// Registers the hooks selected in `options`.
    ///
    /// On failure every hook attached so far is removed again.
    fn attach(&mut self, registry: &SkbHookRegistry, options: &ObserverOptions) -> Result<()> {
        let mut wanted: Vec<(Direction, SkbHookFn, HookContext)> = Vec::new();
        if options.counter {
            wanted.push((Direction::Rx, count_packet, HookContext::from_ref(&self.rx_counter)));
            wanted.push((Direction::Tx, count_packet, HookContext::from_ref(&self.tx_counter)));
        }
        if options.histogram {
            let ctx = HookContext::from_ref(&self.histogram);
            wanted.push((Direction::Rx, histogram_packet, ctx));
            wanted.push((Direction::Tx, histogram_packet, ctx));
        }

        for (direction, hook, ctx) in wanted {
            if let Err(e) = registry.register(direction, Some(hook), ctx) {
                self.detach(registry)?;
                return Err(e.into());
            }
            self.attached.push((direction, hook));
        }

        info!("Attached {} observer hooks", self.attached.len());
        Ok(())
    }

    fn detach(&mut self, registry: &SkbHookRegistry) -> Result<()> {
        for (direction, hook) in self.attached.drain(..).rev() {
            registry.unregister(direction, Some(hook))?;
        }
        Ok(())
    }

    fn observed(&self, options: &ObserverOptions, direction: Direction) -> Option<ObservedTraffic> {
        if !options.counter {
            return None;
        }
        let counter = match direction {
            Direction::Rx => &self.rx_counter,
            Direction::Tx => &self.tx_counter,
        };
        Some(ObservedTraffic {
            packets: counter.packets(),
            bytes: counter.bytes(),
        })
    }
}

/// Builds the worker thread with the given name.
type ThreadFactory = fn(&str) -> thread::Builder;

fn named_thread(name: &str) -> thread::Builder {
    thread::Builder::new().name(name.to_string())
}

/// Runs the simulation described by `settings`.
///
/// Returns early, with `interrupted` set, once `running` is cleared.
pub fn run(settings: &Settings, running: Arc<AtomicBool>) -> Result<RunReport> {
    settings.validate()?;

    let registry = Arc::new(SkbHookRegistry::with_capacity(settings.registry.capacity));
    run_on(settings, running, registry, named_thread)
}

fn run_on(
    settings: &Settings,
    running: Arc<AtomicBool>,
    registry: Arc<SkbHookRegistry>,
    threads: ThreadFactory,
) -> Result<RunReport> {
    let driver = Arc::new(SxDriver::new(
        SxDevice::new(0, "sx0"),
        Arc::clone(&registry),
    ));

    let mut observers = Observers::new();
    observers.attach(&registry, &settings.observers)?;

    info!(
        "Driving {} through {} (rx share {:.2})",
        packet_budget(settings.traffic.packets),
        driver.device(),
        settings.traffic.rx_share
    );

    let start = Instant::now();
    // Every worker has been joined once this returns, whatever the outcome.
    let outcome = drive(settings, &driver, &running, threads);
    observers.detach(&registry)?;
    let churn_report = outcome?;

    let elapsed = start.elapsed();
    let interrupted = !running.load(Ordering::SeqCst);
    if interrupted {
        warn!("Run interrupted after {:.2}s", elapsed.as_secs_f64());
    }

    let counters = driver.counters();
    log_statistics(Direction::Rx, counters.rx_packets, counters.rx_bytes, elapsed);
    log_statistics(Direction::Tx, counters.tx_packets, counters.tx_bytes, elapsed);

    let hooks = registry.statistics();
    log_hook_statistics(&hooks);

    Ok(RunReport {
        device: driver.device().to_string(),
        elapsed_ms: elapsed.as_millis() as u64,
        interrupted,
        driver: counters,
        hooks,
        observed_rx: observers.observed(&settings.observers, Direction::Rx),
        observed_tx: observers.observed(&settings.observers, Direction::Tx),
        histogram: settings
            .observers
            .histogram
            .then(|| observers.histogram.snapshot()),
        churn: churn_report,
    })
}

/// Spawns the churn and traffic workers and waits for all of them.
///
/// If a spawn fails the workers already started are stopped and joined
/// before the error is returned.
fn drive(
    settings: &Settings,
    driver: &Arc<SxDriver>,
    running: &Arc<AtomicBool>,
    threads: ThreadFactory,
) -> Result<Option<ChurnReport>> {
    let traffic_done = Arc::new(AtomicBool::new(false));
    let halt = Arc::new(AtomicBool::new(false));
    let mut failure = None;

    let churn = if settings.observers.churn {
        let spawned = spawn_churn(
            threads("hook-churn"),
            Arc::clone(driver.hooks()),
            Duration::from_micros(settings.observers.churn_interval_us),
            Arc::clone(running),
            Arc::clone(&traffic_done),
        );
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                failure = Some(e);
                None
            }
        }
    } else {
        None
    };

    let mut paths = Vec::new();
    if failure.is_none() {
        for (stream, direction) in Direction::ALL.into_iter().enumerate() {
            let Some(limit) = path_limit(&settings.traffic, direction) else {
                continue;
            };
            let spawned = spawn_path(
                threads(&format!("{}-path", direction)),
                Arc::clone(driver),
                direction,
                limit,
                settings.traffic.clone(),
                stream as u64,
                Arc::clone(running),
                Arc::clone(&halt),
            );
            match spawned {
                Ok(handle) => paths.push((direction, handle)),
                Err(e) => {
                    warn!("Failed to start {} path: {}", direction, e);
                    halt.store(true, Ordering::SeqCst);
                    failure = Some(e);
                    break;
                }
            }
        }
    }

    for (direction, handle) in paths {
        match handle.join() {
            Ok(sent) => debug!("{} path finished after {} packets", direction, sent),
            Err(_) => {
                failure.get_or_insert(SkbHookError::ThreadPanicked(format!("{}-path", direction)));
            }
        }
    }

    traffic_done.store(true, Ordering::SeqCst);
    let churn_report = match churn {
        Some(handle) => match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                failure.get_or_insert(SkbHookError::ThreadPanicked("hook-churn".to_string()));
                None
            }
        },
        None => None,
    };

    match failure {
        Some(e) => Err(e),
        None => Ok(churn_report),
    }
}

fn packet_budget(packets: u64) -> String {
    if packets == 0 {
        "unbounded traffic".to_string()
    } else {
        format!("{} packets", packets)
    }
}

/// Packet limit for one path: `None` to skip the path, `Some(0)` for no
/// limit.
fn path_limit(traffic: &TrafficOptions, direction: Direction) -> Option<u64> {
    let share = match direction {
        Direction::Rx => traffic.rx_share,
        Direction::Tx => 1.0 - traffic.rx_share,
    };

    if traffic.packets == 0 {
        return (share > 0.0).then_some(0);
    }

    let (rx, tx) = traffic.split();
    let count = match direction {
        Direction::Rx => rx,
        Direction::Tx => tx,
    };
    (count > 0).then_some(count)
}

#[allow(clippy::too_many_arguments)]
fn spawn_path(
    builder: thread::Builder,
    driver: Arc<SxDriver>,
    direction: Direction,
    limit: u64,
    traffic: TrafficOptions,
    stream: u64,
    running: Arc<AtomicBool>,
    halt: Arc<AtomicBool>,
) -> Result<JoinHandle<u64>> {
    let pace = (traffic.pps > 0).then(|| Duration::from_secs_f64(1.0 / traffic.pps as f64));

    let handle = builder.spawn(move || {
        let mut generator = TrafficGenerator::from_options(&traffic, stream);
        let mut sent = 0u64;

        while running.load(Ordering::Relaxed)
            && !halt.load(Ordering::Relaxed)
            && (limit == 0 || sent < limit)
        {
            let skb = generator.next_packet(direction);
            driver.handle(&skb);
            sent += 1;

            if let Some(pace) = pace {
                thread::sleep(pace);
            }
        }

        sent
    })?;

    Ok(handle)
}

fn spawn_churn(
    builder: thread::Builder,
    registry: Arc<SkbHookRegistry>,
    interval: Duration,
    running: Arc<AtomicBool>,
    traffic_done: Arc<AtomicBool>,
) -> Result<JoinHandle<ChurnReport>> {
    let handle = builder.spawn(move || {
        // Owned by this thread and outlives every registration made here.
        let hits = AtomicU64::new(0);
        let ctx = HookContext::from_ref(&hits);
        let mut rng = rand::rng();
        let mut report = ChurnReport::default();

        while running.load(Ordering::Relaxed) && !traffic_done.load(Ordering::SeqCst) {
            let direction = if rng.random_bool(0.5) {
                Direction::Rx
            } else {
                Direction::Tx
            };

            let result = if registry.is_registered(direction, probe_packet) {
                registry
                    .unregister(direction, Some(probe_packet))
                    .map(|()| report.unregistered += 1)
            } else {
                registry
                    .register(direction, Some(probe_packet), ctx)
                    .map(|()| report.registered += 1)
            };

            if let Err(e) = result {
                debug!("Churn on {} path: {}", direction, e);
                report.rejected += 1;
            }

            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }

        for direction in Direction::ALL {
            if registry.unregister(direction, Some(probe_packet)).is_ok() {
                report.unregistered += 1;
            }
        }

        report.probe_hits = hits.load(Ordering::Relaxed);
        report
    })?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsBuilder;

    #[test]
    fn test_run_counts_every_packet() {
        let settings = SettingsBuilder::new()
            .packets(1_000)
            .packet_size(60, 200)
            .rx_share(0.25)
            .seed(11)
            .build();

        let report = run(&settings, Arc::new(AtomicBool::new(true))).unwrap();

        assert!(!report.interrupted);
        assert_eq!(report.driver.rx_packets, 250);
        assert_eq!(report.driver.tx_packets, 750);

        let rx = report.observed_rx.unwrap();
        let tx = report.observed_tx.unwrap();
        assert_eq!(rx.packets, 250);
        assert_eq!(rx.bytes, report.driver.rx_bytes);
        assert_eq!(tx.packets, 750);
        assert_eq!(report.histogram.unwrap().total(), 1_000);

        // Counter and histogram on each path.
        assert_eq!(report.hooks.rx.invocations, 500);
        assert_eq!(report.hooks.tx.invocations, 1_500);
        assert_eq!(report.hooks.rx.registered, 0);
        assert_eq!(report.hooks.tx.registered, 0);
    }

    #[test]
    fn test_run_without_observers() {
        let settings = SettingsBuilder::new()
            .packets(100)
            .rx_share(1.0)
            .without_counter()
            .without_histogram()
            .build();

        let report = run(&settings, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(report.driver.rx_packets, 100);
        assert_eq!(report.driver.tx_packets, 0);
        assert!(report.observed_rx.is_none());
        assert!(report.histogram.is_none());
        assert_eq!(report.hooks.rx.empty_passes, 100);
    }

    #[test]
    fn test_run_with_churn_leaves_registry_clean() {
        let settings = SettingsBuilder::new()
            .packets(20_000)
            .packet_size(60, 64)
            .churn(0)
            .seed(3)
            .build();

        let report = run(&settings, Arc::new(AtomicBool::new(true))).unwrap();
        let churn = report.churn.unwrap();

        assert_eq!(churn.registered, churn.unregistered);
        assert_eq!(churn.rejected, 0);
        assert_eq!(report.observed_rx.unwrap().packets, 10_000);
        assert_eq!(report.observed_tx.unwrap().packets, 10_000);
    }

    #[test]
    fn test_cleared_flag_stops_unbounded_run() {
        let settings = SettingsBuilder::new().packets(0).build();
        let running = Arc::new(AtomicBool::new(false));

        let report = run(&settings, running).unwrap();

        assert!(report.interrupted);
        assert_eq!(report.driver.rx_packets + report.driver.tx_packets, 0);
    }

    #[test]
    fn test_invalid_settings_rejected_before_running() {
        let settings = SettingsBuilder::new().rx_share(-1.0).build();
        let err = run(&settings, Arc::new(AtomicBool::new(true))).unwrap_err();
        assert!(matches!(err, SkbHookError::InvalidSettings(_)));
    }

    /// Thread factory whose TX path cannot be spawned.
    fn tx_spawn_fails(name: &str) -> thread::Builder {
        let builder = named_thread(name);
        if name == "tx-path" {
            // No system can map a stack this large.
            builder.stack_size((usize::MAX / 4) & !0xFFFF)
        } else {
            builder
        }
    }

    #[test]
    fn test_spawn_failure_stops_workers_and_detaches_hooks() {
        // Unbounded, so the RX path only stops when told to.
        let settings = SettingsBuilder::new().packets(0).churn(50).build();
        let registry = Arc::new(SkbHookRegistry::new());
        let running = Arc::new(AtomicBool::new(true));

        let err = run_on(&settings, Arc::clone(&running), Arc::clone(&registry), tx_spawn_fails)
            .unwrap_err();

        assert!(matches!(err, SkbHookError::Io(_)));
        assert!(registry.is_empty(Direction::Rx));
        assert!(registry.is_empty(Direction::Tx));
        // Workers were stopped without touching the caller's flag.
        assert!(running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_path_limit() {
        let mut traffic = TrafficOptions {
            packets: 10,
            rx_share: 1.0,
            ..Default::default()
        };
        assert_eq!(path_limit(&traffic, Direction::Rx), Some(10));
        assert_eq!(path_limit(&traffic, Direction::Tx), None);

        traffic.packets = 0;
        assert_eq!(path_limit(&traffic, Direction::Rx), Some(0));
        assert_eq!(path_limit(&traffic, Direction::Tx), None);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let settings = SettingsBuilder::new().packets(10).seed(1).build();
        let report = run(&settings, Arc::new(AtomicBool::new(true))).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["driver"]["rx_packets"], 5);
        assert!(json.get("churn").is_none());
    }
}
