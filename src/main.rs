//! Radio-dial installation host - entry point
//!
//! Runs the acquisition/tuning pipeline headless. The first argument
//! selects the operator mode:
//!
//! - `run` (default) - full pipeline: stations from config, haptic
//!   feedback, LED mode tracking the tune status
//! - `calibrate` - periodic raw-value readout for dialing in the station
//!   table; the console light follows the rotary switch as a sanity check
//! - `tuner` - tuning readout: value, dial frequency and status
//!
//! Rendering of the art programs attaches elsewhere; this binary logs the
//! program switches the renderer would act on.

use anyhow::bail;
use radiodial_rs::config::{AppConfig, ConsoleDriver};
use radiodial_rs::console::{ConsoleEvent, ConsoleHandle, ConsoleTransport, Poller};
use radiodial_rs::feedback::{TuningFeedback, TuningPipeline};
use radiodial_rs::tuner::Tuner;
use radiodial_rs::types::{LedMode, TuneStatus};
use radiodial_rs::SimulatedConsole;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default();

    // Keep the guard alive for the life of the process so buffered log
    // lines are flushed on exit
    let _file_guard = init_logging(&config);

    tracing::info!("Starting radio-dial host");

    let mode = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match mode.as_str() {
        "run" => run(config),
        "calibrate" => calibrate(config),
        "tuner" => tuner_readout(config),
        other => bail!("unknown mode '{}' (expected run, calibrate or tuner)", other),
    }
}

/// Initialize stdout logging, plus a rolling file when `log_dir` is set
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "radiodial.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,radiodial_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Open the transport the config asks for
fn build_transport(config: &AppConfig) -> anyhow::Result<Box<dyn ConsoleTransport>> {
    match config.console.driver {
        ConsoleDriver::Sim => {
            tracing::info!("Using the simulated console");
            Ok(Box::new(SimulatedConsole::new()))
        }
        #[cfg(feature = "i2c-console")]
        ConsoleDriver::I2c => {
            let transport = radiodial_rs::console::I2cTransport::new(
                config.console.i2c_bus,
                config.console.i2c_address,
            )?;
            Ok(Box::new(transport))
        }
        #[cfg(not(feature = "i2c-console"))]
        ConsoleDriver::I2c => {
            bail!("config selects the i2c driver, but this build lacks the i2c-console feature")
        }
    }
}

/// Drain poller events into the log
fn log_events(handle: &ConsoleHandle) {
    for event in handle.drain_events() {
        match event {
            ConsoleEvent::Stats(stats) => tracing::debug!(
                "Poll stats: {} ok, {} skipped, avg cycle {:.0} us",
                stats.successful_cycles,
                stats.failed_cycles,
                stats.avg_cycle_time_us()
            ),
            ConsoleEvent::TransportError(e) => tracing::debug!("Transport hiccup: {}", e),
            ConsoleEvent::Shutdown => tracing::info!("Poller shut down"),
        }
    }
}

/// Full pipeline: tuning drives program selection and haptics
fn run(config: AppConfig) -> anyhow::Result<()> {
    if config.stations.is_empty() {
        tracing::warn!("No stations configured; the dial will never tune");
    }

    let tuner = Arc::new(Tuner::new(config.tuner.clone()));
    for station in &config.stations {
        tracing::info!("Adding station '{}' at {:.1} MHz", station.name, station.mhz);
        tuner.add_station_frequency(station.freq_tenths());
    }

    let (mut poller, handle) = Poller::new(
        build_transport(&config)?,
        Duration::from_millis(config.console.poll_interval_ms),
    );
    poller.set_observer(Box::new(TuningPipeline::new(
        Arc::clone(&tuner),
        TuningFeedback::new(config.feedback.clone()),
    )));
    let worker = poller.spawn()?;

    handle.set_light(true);

    let mut current_station: Option<usize> = None;
    let mut current_led: Option<LedMode> = None;

    while handle.is_running() {
        log_events(&handle);

        let (station, status) = tuner.get_status();
        if station != current_station {
            match station {
                Some(ix) => {
                    let name = config
                        .stations
                        .get(ix)
                        .map(|s| s.name.as_str())
                        .unwrap_or("?");
                    tracing::info!("Dial moved to station {} ('{}')", ix, name);
                }
                None => tracing::info!("Dial left all stations"),
            }
            current_station = station;
        }

        // The LEDs mirror how close the operator is to locking on
        let led = match status {
            TuneStatus::Tuned => LedMode::On,
            TuneStatus::Above | TuneStatus::Below => LedMode::Pulse,
            _ => LedMode::BlinkA,
        };
        if current_led != Some(led) {
            handle.set_led(led);
            current_led = Some(led);
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    worker.join().ok();
    Ok(())
}

/// Raw-value readout for station calibration
fn calibrate(config: AppConfig) -> anyhow::Result<()> {
    let (poller, handle) = Poller::new(
        build_transport(&config)?,
        Duration::from_millis(config.console.poll_interval_ms),
    );
    let worker = poller.spawn()?;

    let mut light_on = false;

    while handle.is_running() {
        log_events(&handle);

        if let Some(snapshot) = handle.get_values() {
            tracing::info!(
                "tuner {:4}  a {:4}  b {:4}  c {:4}  sw {:2}",
                snapshot.tuner,
                snapshot.knob_a,
                snapshot.knob_b,
                snapshot.knob_c,
                snapshot.switch_level
            );

            // The light follows the switch so the wiring can be checked
            let want_light = snapshot.switch_level > 0;
            if want_light != light_on {
                handle.set_light(want_light);
                light_on = want_light;
            }
        }

        std::thread::sleep(Duration::from_millis(200));
    }

    worker.join().ok();
    Ok(())
}

/// Tuning readout: value, dial frequency and status
fn tuner_readout(config: AppConfig) -> anyhow::Result<()> {
    let tuner = Arc::new(Tuner::new(config.tuner.clone()));
    if config.stations.is_empty() {
        // A bare test rig still wants something to tune against
        tuner.add_station_frequency(980);
    } else {
        for station in &config.stations {
            tuner.add_station_frequency(station.freq_tenths());
        }
    }

    let (mut poller, handle) = Poller::new(
        build_transport(&config)?,
        Duration::from_millis(config.console.poll_interval_ms),
    );
    poller.set_observer(Box::new(TuningPipeline::new(
        Arc::clone(&tuner),
        TuningFeedback::new(config.feedback.clone()),
    )));
    let worker = poller.spawn()?;

    while handle.is_running() {
        log_events(&handle);

        if let Some(snapshot) = handle.get_values() {
            let (station, status) = tuner.get_status();
            tracing::info!(
                "tuner {:4}  {:5.1} MHz  station {:?}  {:?}",
                snapshot.tuner,
                tuner.value_to_frequency(snapshot.tuner) as f64 * 0.1,
                station,
                status
            );
        }

        std::thread::sleep(Duration::from_millis(100));
    }

    worker.join().ok();
    Ok(())
}
