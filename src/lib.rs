//! # radiodial-rs: acquisition and tuning core for a radio-dial installation
//!
//! A physical console (tuning knob, three auxiliary knobs, a rotary
//! switch, a light and a vibration motor) is sampled by a small device
//! that a host polls over a byte transport. This crate is the host-side
//! core plus a faithful model of the device side:
//!
//! - **Console**: sample logs with trimmed-mean estimates, the one-byte
//!   command protocol and 9-byte snapshot record, the polling thread and
//!   its thread-safe handle, a simulated console for hardware-less runs
//! - **Tuner**: hysteretic state machine mapping the smoothed tuner
//!   reading onto a `(station, status)` pair, plus the dial frequency
//!   calibration
//! - **Feedback**: the policy turning status transitions into haptic
//!   pulses
//!
//! Rendering of the selected art program, display backends and waveform
//! generation live outside this crate; the core only exposes values and
//! accepts actuator commands through narrow interfaces.
//!
//! ## Example
//!
//! ```no_run
//! use radiodial_rs::config::AppConfig;
//! use radiodial_rs::console::{Poller, SimulatedConsole};
//! use radiodial_rs::feedback::{TuningFeedback, TuningPipeline};
//! use radiodial_rs::tuner::Tuner;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = AppConfig::default();
//! let tuner = Arc::new(Tuner::new(config.tuner.clone()));
//! tuner.add_station_frequency(980);
//!
//! let (mut poller, handle) = Poller::new(
//!     Box::new(SimulatedConsole::new()),
//!     Duration::from_millis(config.console.poll_interval_ms),
//! );
//! poller.set_observer(Box::new(TuningPipeline::new(
//!     tuner.clone(),
//!     TuningFeedback::new(config.feedback.clone()),
//! )));
//! poller.spawn().unwrap();
//!
//! let (station, status) = tuner.get_status();
//! println!("station {:?}, status {:?}", station, status);
//! # handle.shutdown();
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod feedback;
pub mod tuner;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use console::{ConsoleHandle, ConsoleTransport, Poller, SimulatedConsole};
pub use error::{RadioDialError, Result};
pub use feedback::{TuningFeedback, TuningPipeline};
pub use tuner::Tuner;
pub use types::{BuzzKind, Channel, LedMode, PollStats, Snapshot, TuneStatus};
