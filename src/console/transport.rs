//! Transport boundary between the controller and the sampling device
//!
//! The core is transport-agnostic: any ordered, lossy-tolerant byte channel
//! works. The installation uses I2C ([`I2cTransport`]); tests and
//! hardware-less development use the simulator ([`SimulatedConsole`]).
//!
//! [`I2cTransport`]: crate::console::i2c::I2cTransport
//! [`SimulatedConsole`]: crate::console::sim::SimulatedConsole

use crate::error::Result;

/// Byte-oriented duplex link to the sampling device
///
/// Implementations must be `Send` so the poller can own the link on its
/// own thread. Errors from either direction cause the current poll cycle
/// to be skipped, nothing more.
pub trait ConsoleTransport: Send {
    /// Write command bytes to the device
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes from the device
    ///
    /// Returns the number of bytes actually read. Reading fewer bytes than
    /// requested is not an error at this layer; the protocol layer decides
    /// whether the response is usable.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Human-readable description of the link, for logs
    fn describe(&self) -> String {
        "console".to_string()
    }
}
