//! Poller behavior under transport trouble and threaded operation

mod common;

use radiodial_rs::console::{ConsoleEvent, ConsoleTransport, Poller, SimulatedConsole};
use radiodial_rs::error::{RadioDialError, Result};
use radiodial_rs::types::{BuzzKind, LedMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps a transport and fails on demand
struct FlakyTransport {
    inner: SimulatedConsole,
    failing: Arc<AtomicBool>,
}

impl FlakyTransport {
    fn new(inner: SimulatedConsole) -> (Self, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner,
                failing: Arc::clone(&failing),
            },
            failing,
        )
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RadioDialError::Transport("bus glitch".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ConsoleTransport for FlakyTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.check()?;
        self.inner.send(bytes)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check()?;
        self.inner.recv(buf)
    }
}

#[test]
fn test_failed_cycle_keeps_previous_snapshot_live() {
    let sim = SimulatedConsole::new();
    let controls = sim.controls();
    controls.run_ticks(100);
    let (flaky, failing) = FlakyTransport::new(sim);
    let (mut poller, handle) = Poller::new(Box::new(flaky), Duration::from_millis(20));

    poller.poll_once().unwrap();
    let before = handle.get_values().expect("snapshot after first poll");

    failing.store(true, Ordering::SeqCst);
    assert!(poller.poll_once().is_err());
    assert!(poller.poll_once().is_err());

    // Stale but valid: the last good snapshot is still served
    assert_eq!(handle.get_values(), Some(before));
    let stats = handle.stats();
    assert_eq!(stats.successful_cycles, 1);
    assert_eq!(stats.failed_cycles, 2);

    // The bus recovers and the next scheduled cycle succeeds
    failing.store(false, Ordering::SeqCst);
    poller.poll_once().unwrap();
    assert_eq!(handle.stats().successful_cycles, 2);
}

#[test]
fn test_commands_survive_an_outage() {
    let sim = SimulatedConsole::new();
    let controls = sim.controls();
    controls.run_ticks(100);
    let (flaky, failing) = FlakyTransport::new(sim);
    let (mut poller, handle) = Poller::new(Box::new(flaky), Duration::from_millis(20));

    handle.set_light(true);
    handle.buzz(BuzzKind::Boop);

    failing.store(true, Ordering::SeqCst);
    assert!(poller.poll_once().is_err());
    // Nothing reached the device during the outage
    assert!(!controls.actuators().light);

    failing.store(false, Ordering::SeqCst);
    poller.poll_once().unwrap();
    let state = controls.actuators();
    assert!(state.light);
    assert_eq!(state.boops, 1);
}

#[test]
fn test_failure_events_are_reported() {
    let sim = SimulatedConsole::new();
    let (flaky, failing) = FlakyTransport::new(sim);
    let (mut poller, handle) = Poller::new(Box::new(flaky), Duration::from_millis(20));

    failing.store(true, Ordering::SeqCst);
    let _ = poller.poll_once();

    let events = handle.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, ConsoleEvent::TransportError(_))));
}

#[test]
fn test_threaded_poller_runs_on_its_own_schedule() {
    use radiodial_rs::config::{AppConfig, FeedbackConfig};
    use radiodial_rs::console::SignalPattern;
    use radiodial_rs::feedback::{TuningFeedback, TuningPipeline};
    use radiodial_rs::tuner::Tuner;
    use radiodial_rs::types::{Channel, TuneStatus};

    let config = AppConfig::default();
    let tuner = Arc::new(Tuner::new(config.tuner.clone()));
    tuner.add_station(300);

    let sim = SimulatedConsole::new().with_pattern(Channel::Tuner, SignalPattern::Constant(300));
    let controls = sim.controls();
    controls.run_ticks(100);

    let (mut poller, handle) = Poller::new(Box::new(sim), Duration::from_millis(20));
    poller.set_observer(Box::new(TuningPipeline::new(
        Arc::clone(&tuner),
        TuningFeedback::new(FeedbackConfig { debounce_ms: 0 }),
    )));
    let worker = poller.spawn().unwrap();

    // Give the schedule a few cycles of wall-clock time
    std::thread::sleep(Duration::from_millis(200));

    let snapshot = handle.get_values().expect("snapshot from polling thread");
    assert_eq!(snapshot.tuner, 300);
    assert!(handle.stats().successful_cycles >= 2);
    assert_eq!(tuner.get_status().1, TuneStatus::Tuned);

    handle.set_led(LedMode::On);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(controls.actuators().led, LedMode::On);

    handle.shutdown();
    worker.join().unwrap();
    assert!(handle
        .drain_events()
        .iter()
        .any(|e| matches!(e, ConsoleEvent::Shutdown)));
}
