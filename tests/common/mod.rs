//! Common test utilities for the integration suite

#![allow(dead_code)] // Test utilities may not all be used in every test file

use radiodial_rs::config::{AppConfig, FeedbackConfig};
use radiodial_rs::console::{ConsoleHandle, Poller, SimControls, SignalPattern, SimulatedConsole};
use radiodial_rs::feedback::{TuningFeedback, TuningPipeline};
use radiodial_rs::tuner::Tuner;
use radiodial_rs::types::Channel;
use std::sync::Arc;
use std::time::Duration;

/// Ticks guaranteed to flush a sample log completely
pub const FLUSH_TICKS: u64 = 100;

/// A fully wired pipeline over a simulated console
pub struct TestPipeline {
    pub poller: Poller,
    pub handle: ConsoleHandle,
    pub controls: SimControls,
    pub tuner: Arc<Tuner>,
}

/// Build a pipeline with the given station targets (raw values) and a
/// short feedback debounce so tests do not sleep for a second at a time.
pub fn sim_pipeline(stations: &[i32], debounce_ms: u64, tuner_value: u16) -> TestPipeline {
    let config = AppConfig::default();

    let tuner = Arc::new(Tuner::new(config.tuner.clone()));
    for &target in stations {
        tuner.add_station(target);
    }

    let sim = SimulatedConsole::new()
        .with_pattern(Channel::Tuner, SignalPattern::Constant(tuner_value));
    let controls = sim.controls();
    controls.run_ticks(FLUSH_TICKS);

    let (mut poller, handle) = Poller::new(
        Box::new(sim),
        Duration::from_millis(config.console.poll_interval_ms),
    );
    poller.set_observer(Box::new(TuningPipeline::new(
        Arc::clone(&tuner),
        TuningFeedback::new(FeedbackConfig { debounce_ms }),
    )));

    TestPipeline {
        poller,
        handle,
        controls,
        tuner,
    }
}

impl TestPipeline {
    /// Move the simulated tuner pot and let the sample log settle
    pub fn move_tuner(&self, value: u16) {
        self.controls
            .set_pattern(Channel::Tuner, SignalPattern::Constant(value));
        self.controls.run_ticks(FLUSH_TICKS);
    }

    /// Run a number of poll cycles back to back
    pub fn poll(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.poller.poll_once().expect("poll cycle failed");
        }
    }
}
