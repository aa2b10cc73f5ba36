//! Device-side endpoint of the snapshot protocol
//!
//! [`SamplerDevice`] models the sampling microcontroller: per-channel
//! sample logs fed by the acquisition tick, a small inbound command buffer
//! filled from bus interrupts, and a latched response buffer served on the
//! next read. The model is exact enough that the simulator and the test
//! suite exercise the same protocol semantics the firmware implements:
//! bounded buffers that drop instead of block, silent tolerance of unknown
//! opcodes, and byte-truncation of the response when the buffer is small.
//!
//! Actuator waveforms (LED PWM, vibration envelopes) are the physical
//! device's concern; this model only latches the requested state so tests
//! and the simulator can observe it.

use crate::console::protocol::{self, opcode};
use crate::console::sample_log::SampleLog;
use crate::types::{BuzzKind, Channel, LedMode, Snapshot};

/// Capacity of the inbound command buffer; bytes beyond it are dropped
pub const COMMAND_BUFFER_CAPACITY: usize = 8;

/// Capacity of the outbound response buffer
pub const RESPONSE_BUFFER_CAPACITY: usize = 10;

/// Switch level reported when the rotary switch sits on its active detent
pub const SWITCH_ACTIVE_LEVEL: u8 = 15;

/// Actuator state latched by the device
///
/// Buzz requests are counted rather than stored as waveforms: the counts
/// let observers assert exactly how often each haptic pattern was
/// triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    /// Console light relay
    pub light: bool,
    /// Current LED animation mode
    pub led: LedMode,
    /// Most recent haptic request
    pub last_buzz: Option<BuzzKind>,
    /// Number of boop patterns triggered
    pub boops: u32,
    /// Number of beep-beep patterns triggered
    pub beep_beeps: u32,
}

/// The sampling device model
#[derive(Debug)]
pub struct SamplerDevice {
    tuner_log: SampleLog,
    knob_a_log: SampleLog,
    knob_b_log: SampleLog,
    knob_c_log: SampleLog,
    switch_level: u8,
    command_buf: [u8; COMMAND_BUFFER_CAPACITY],
    command_len: usize,
    dropped_bytes: u64,
    response: [u8; RESPONSE_BUFFER_CAPACITY],
    response_len: usize,
    actuators: ActuatorState,
}

impl Default for SamplerDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerDevice {
    /// Create a device with empty logs and power-on actuator state
    pub fn new() -> Self {
        Self {
            tuner_log: SampleLog::new(),
            knob_a_log: SampleLog::new(),
            knob_b_log: SampleLog::new(),
            knob_c_log: SampleLog::new(),
            switch_level: 0,
            command_buf: [0; COMMAND_BUFFER_CAPACITY],
            command_len: 0,
            dropped_bytes: 0,
            response: [0; RESPONSE_BUFFER_CAPACITY],
            response_len: 0,
            actuators: ActuatorState::default(),
        }
    }

    /// Record one raw reading for a channel (the acquisition tick)
    ///
    /// Analog channels go through their sample log; the switch is stored
    /// as a discrete level (any non-zero reading counts as the active
    /// detent).
    pub fn record(&mut self, channel: Channel, raw: u16) {
        match channel {
            Channel::Tuner => self.tuner_log.record(raw),
            Channel::KnobA => self.knob_a_log.record(raw),
            Channel::KnobB => self.knob_b_log.record(raw),
            Channel::KnobC => self.knob_c_log.record(raw),
            Channel::Switch => {
                self.switch_level = if raw == 0 { 0 } else { SWITCH_ACTIVE_LEVEL };
            }
        }
    }

    /// Accept inbound bytes from the bus
    ///
    /// Bytes past [`COMMAND_BUFFER_CAPACITY`] are discarded until
    /// [`process`] drains the buffer; the bus handler runs in interrupt
    /// context and must never stall.
    ///
    /// [`process`]: SamplerDevice::process
    pub fn receive(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.command_len == COMMAND_BUFFER_CAPACITY {
                self.dropped_bytes += 1;
                continue;
            }
            self.command_buf[self.command_len] = b;
            self.command_len += 1;
        }
    }

    /// Drain and execute all buffered commands
    pub fn process(&mut self) {
        let len = self.command_len;
        self.command_len = 0;
        for i in 0..len {
            self.handle_command(self.command_buf[i]);
        }
    }

    /// Serve the latched response
    ///
    /// Copies at most `out.len()` bytes and returns the count. The
    /// response stays latched; a repeated read serves the same record.
    pub fn respond(&self, out: &mut [u8]) -> usize {
        let n = self.response_len.min(out.len());
        out[..n].copy_from_slice(&self.response[..n]);
        n
    }

    /// Current actuator state
    pub fn actuators(&self) -> ActuatorState {
        self.actuators
    }

    /// Bytes dropped by command buffer back-pressure
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes
    }

    /// Robust estimate of one channel
    ///
    /// Analog channels report their sample log's trimmed mean; the switch
    /// reports its discrete level. Same precondition as
    /// [`SampleLog::estimate`]: at least one reading must exist.
    pub fn estimate(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Tuner => self.tuner_log.estimate(),
            Channel::KnobA => self.knob_a_log.estimate(),
            Channel::KnobB => self.knob_b_log.estimate(),
            Channel::KnobC => self.knob_c_log.estimate(),
            Channel::Switch => u16::from(self.switch_level),
        }
    }

    fn handle_command(&mut self, op: u8) {
        match op {
            opcode::READ_SNAPSHOT => self.latch_snapshot(),
            opcode::LIGHT_OFF => self.actuators.light = false,
            opcode::LIGHT_ON => self.actuators.light = true,
            opcode::BUZZ_BEEP_BEEP => {
                self.actuators.last_buzz = Some(BuzzKind::BeepBeep);
                self.actuators.beep_beeps += 1;
            }
            opcode::BUZZ_BOOP => {
                self.actuators.last_buzz = Some(BuzzKind::Boop);
                self.actuators.boops += 1;
            }
            _ => {
                if let Some(mode) = protocol::led_mode_from_opcode(op) {
                    self.actuators.led = mode;
                }
                // Anything else is bus noise; ignore it.
            }
        }
    }

    fn latch_snapshot(&mut self) {
        let snapshot = Snapshot {
            tuner: self.estimate(Channel::Tuner),
            knob_a: self.estimate(Channel::KnobA),
            knob_b: self.estimate(Channel::KnobB),
            knob_c: self.estimate(Channel::KnobC),
            switch_level: self.switch_level,
        };
        self.response_len = protocol::encode_snapshot_into(&snapshot, &mut self.response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::protocol::{decode_snapshot, SNAPSHOT_WIRE_SIZE};

    fn device_with_readings() -> SamplerDevice {
        let mut device = SamplerDevice::new();
        for _ in 0..5 {
            device.record(Channel::Tuner, 300);
            device.record(Channel::KnobA, 100);
            device.record(Channel::KnobB, 200);
            device.record(Channel::KnobC, 400);
            device.record(Channel::Switch, 1023);
        }
        device
    }

    #[test]
    fn test_snapshot_request_latches_estimates() {
        let mut device = device_with_readings();
        device.receive(&[opcode::READ_SNAPSHOT]);
        device.process();

        let mut buf = [0u8; SNAPSHOT_WIRE_SIZE];
        let n = device.respond(&mut buf);
        assert_eq!(n, SNAPSHOT_WIRE_SIZE);

        let snapshot = decode_snapshot(&buf).unwrap();
        assert_eq!(snapshot.tuner, 300);
        assert_eq!(snapshot.knob_a, 100);
        assert_eq!(snapshot.knob_b, 200);
        assert_eq!(snapshot.knob_c, 400);
        assert_eq!(snapshot.switch_level, SWITCH_ACTIVE_LEVEL);
    }

    #[test]
    fn test_response_stays_latched_until_next_request() {
        let mut device = device_with_readings();
        device.receive(&[opcode::READ_SNAPSHOT]);
        device.process();

        let mut first = [0u8; SNAPSHOT_WIRE_SIZE];
        device.respond(&mut first);

        // New readings change the logs, but not the latched response
        for _ in 0..60 {
            device.record(Channel::Tuner, 900);
        }
        let mut second = [0u8; SNAPSHOT_WIRE_SIZE];
        device.respond(&mut second);
        assert_eq!(first, second);

        device.receive(&[opcode::READ_SNAPSHOT]);
        device.process();
        let mut third = [0u8; SNAPSHOT_WIRE_SIZE];
        device.respond(&mut third);
        assert_eq!(decode_snapshot(&third).unwrap().tuner, 900);
    }

    #[test]
    fn test_command_buffer_drops_overflow() {
        let mut device = device_with_readings();
        let burst = [opcode::LIGHT_ON; COMMAND_BUFFER_CAPACITY + 3];
        device.receive(&burst);
        assert_eq!(device.dropped_bytes(), 3);

        // The buffered commands still execute normally
        device.process();
        assert!(device.actuators().light);

        // Draining makes room again
        device.receive(&[opcode::LIGHT_OFF]);
        device.process();
        assert!(!device.actuators().light);
        assert_eq!(device.dropped_bytes(), 3);
    }

    #[test]
    fn test_unknown_opcodes_are_ignored() {
        let mut device = device_with_readings();
        device.receive(&[0xFF, 0x99, opcode::LIGHT_ON, 0x7E]);
        device.process();
        // The valid command in the middle of the noise still applies
        assert!(device.actuators().light);
        assert_eq!(device.actuators().last_buzz, None);
    }

    #[test]
    fn test_actuator_latching_and_counts() {
        let mut device = device_with_readings();
        device.receive(&[
            opcode::BUZZ_BEEP_BEEP,
            opcode::BUZZ_BOOP,
            opcode::BUZZ_BOOP,
            protocol::led_opcode(LedMode::Pulse),
        ]);
        device.process();

        let state = device.actuators();
        assert_eq!(state.beep_beeps, 1);
        assert_eq!(state.boops, 2);
        assert_eq!(state.last_buzz, Some(BuzzKind::Boop));
        assert_eq!(state.led, LedMode::Pulse);
    }

    #[test]
    fn test_switch_level_is_discrete() {
        let mut device = device_with_readings();
        device.record(Channel::Switch, 0);
        device.receive(&[opcode::READ_SNAPSHOT]);
        device.process();
        let mut buf = [0u8; SNAPSHOT_WIRE_SIZE];
        device.respond(&mut buf);
        assert_eq!(decode_snapshot(&buf).unwrap().switch_level, 0);

        device.record(Channel::Switch, 1);
        device.receive(&[opcode::READ_SNAPSHOT]);
        device.process();
        device.respond(&mut buf);
        assert_eq!(
            decode_snapshot(&buf).unwrap().switch_level,
            SWITCH_ACTIVE_LEVEL
        );
    }

    #[test]
    fn test_power_on_led_mode_blinks() {
        let device = SamplerDevice::new();
        assert_eq!(device.actuators().led, LedMode::BlinkA);
    }
}
