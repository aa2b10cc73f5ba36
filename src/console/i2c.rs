//! I2C transport to the physical console
//!
//! The sampling device answers as an I2C slave (address 0x50 on bus 1 in
//! the installed console). Transfer errors are returned to the poller,
//! which skips the cycle; the bus is reopened only by restarting the
//! process, matching how the installation is operated.

use crate::console::transport::ConsoleTransport;
use crate::error::Result;
use rppal::i2c::I2c;

/// Console link over `/dev/i2c-<bus>`
pub struct I2cTransport {
    i2c: I2c,
    bus: u8,
    address: u16,
}

impl I2cTransport {
    /// Open the bus and select the device address
    pub fn new(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus)?;
        i2c.set_slave_address(address)?;
        tracing::info!("Opened /dev/i2c-{} at address 0x{:02x}", bus, address);
        Ok(Self { i2c, bus, address })
    }
}

impl ConsoleTransport for I2cTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.i2c.write(bytes)?;
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.i2c.read(buf)?;
        Ok(n)
    }

    fn describe(&self) -> String {
        format!("i2c-{} @ 0x{:02x}", self.bus, self.address)
    }
}
