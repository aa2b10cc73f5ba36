//! Console side of the installation: acquisition, protocol, polling
//!
//! The physical console is a box of knobs sampled by a small
//! microcontroller that answers a one-byte command protocol over I2C. This
//! module holds both ends of that conversation plus everything between:
//!
//! - [`SampleLog`] - per-channel circular log with a trimmed-mean estimate
//! - [`protocol`] - opcodes and the 9-byte snapshot wire record
//! - [`ConsoleTransport`] - the byte-channel boundary (I2C, simulator, ...)
//! - [`SamplerDevice`] - device-side protocol endpoint, also used by the
//!   simulator and the test suite
//! - [`SimulatedConsole`] - pattern-driven console stand-in
//! - [`Poller`] / [`ConsoleHandle`] - the controller-side polling thread
//!   and its thread-safe handle
//!
//! # Example
//!
//! ```no_run
//! use radiodial_rs::console::{Poller, SimulatedConsole};
//! use std::time::Duration;
//!
//! let sim = SimulatedConsole::new();
//! let (poller, handle) = Poller::new(Box::new(sim), Duration::from_millis(20));
//! poller.spawn().unwrap();
//!
//! // From any thread:
//! if let Some(snapshot) = handle.get_values() {
//!     println!("tuner at {}", snapshot.tuner);
//! }
//! ```

pub mod device;
#[cfg(feature = "i2c-console")]
pub mod i2c;
pub mod poller;
pub mod protocol;
pub mod sample_log;
pub mod sim;
pub mod transport;

pub use device::{ActuatorState, SamplerDevice};
#[cfg(feature = "i2c-console")]
pub use i2c::I2cTransport;
pub use poller::{CommandLatch, ConsoleEvent, ConsoleHandle, Poller, ValueObserver};
pub use protocol::{decode_snapshot, encode_snapshot, SNAPSHOT_WIRE_SIZE};
pub use sample_log::{SampleLog, SAMPLE_LOG_CAPACITY};
pub use sim::{SignalPattern, SimControls, SimulatedConsole};
pub use transport::ConsoleTransport;
