//! Wire protocol between the controller and the sampling device
//!
//! Commands are single opcode bytes with no payload. The snapshot record is
//! a fixed 9-byte layout: four little-endian `u16` channel estimates
//! followed by one `u8` switch level, in natural field order with no
//! padding. A device with a smaller response buffer truncates trailing
//! fields; it never reorders them.
//!
//! Unknown opcodes are not an error anywhere in the stack: the bus is
//! noisy and a stray byte must never crash or corrupt either endpoint.

use crate::error::{RadioDialError, Result};
use crate::types::{BuzzKind, LedMode, Snapshot};

/// Command opcodes understood by the sampling device
pub mod opcode {
    /// Latch the serialized snapshot for the next read-response
    pub const READ_SNAPSHOT: u8 = 0x00;
    /// Console light off
    pub const LIGHT_OFF: u8 = 0x10;
    /// Console light on
    pub const LIGHT_ON: u8 = 0x11;
    /// Start the beep-beep haptic pattern
    pub const BUZZ_BEEP_BEEP: u8 = 0x20;
    /// Start the boop haptic pattern
    pub const BUZZ_BOOP: u8 = 0x21;
    /// First LED mode opcode; modes are `LED_BASE + mode index`
    pub const LED_BASE: u8 = 0x30;
}

/// Size of the serialized snapshot record
pub const SNAPSHOT_WIRE_SIZE: usize = 9;

/// Serialize a snapshot into its 9-byte wire form
pub fn encode_snapshot(snapshot: &Snapshot) -> [u8; SNAPSHOT_WIRE_SIZE] {
    let mut out = [0u8; SNAPSHOT_WIRE_SIZE];
    out[0..2].copy_from_slice(&snapshot.tuner.to_le_bytes());
    out[2..4].copy_from_slice(&snapshot.knob_a.to_le_bytes());
    out[4..6].copy_from_slice(&snapshot.knob_b.to_le_bytes());
    out[6..8].copy_from_slice(&snapshot.knob_c.to_le_bytes());
    out[8] = snapshot.switch_level;
    out
}

/// Serialize a snapshot into a caller-provided buffer
///
/// Writes at most `out.len()` bytes; a short buffer drops trailing fields
/// byte by byte. Returns the number of bytes written.
pub fn encode_snapshot_into(snapshot: &Snapshot, out: &mut [u8]) -> usize {
    let full = encode_snapshot(snapshot);
    let n = full.len().min(out.len());
    out[..n].copy_from_slice(&full[..n]);
    n
}

/// Parse a snapshot from its wire form
///
/// Fails with [`RadioDialError::ShortRead`] when fewer than
/// [`SNAPSHOT_WIRE_SIZE`] bytes are available; a truncated record is
/// treated the same as a failed transfer.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < SNAPSHOT_WIRE_SIZE {
        return Err(RadioDialError::ShortRead {
            expected: SNAPSHOT_WIRE_SIZE,
            got: bytes.len(),
        });
    }
    Ok(Snapshot {
        tuner: u16::from_le_bytes([bytes[0], bytes[1]]),
        knob_a: u16::from_le_bytes([bytes[2], bytes[3]]),
        knob_b: u16::from_le_bytes([bytes[4], bytes[5]]),
        knob_c: u16::from_le_bytes([bytes[6], bytes[7]]),
        switch_level: bytes[8],
    })
}

/// Opcode for a light command
pub fn light_opcode(on: bool) -> u8 {
    if on {
        opcode::LIGHT_ON
    } else {
        opcode::LIGHT_OFF
    }
}

/// Opcode for a haptic command
pub fn buzz_opcode(kind: BuzzKind) -> u8 {
    match kind {
        BuzzKind::BeepBeep => opcode::BUZZ_BEEP_BEEP,
        BuzzKind::Boop => opcode::BUZZ_BOOP,
    }
}

/// Opcode for an LED mode command
pub fn led_opcode(mode: LedMode) -> u8 {
    let index = match mode {
        LedMode::Off => 0,
        LedMode::On => 1,
        LedMode::Pulse => 2,
        LedMode::BlinkA => 3,
        LedMode::BlinkB => 4,
    };
    opcode::LED_BASE + index
}

/// LED mode selected by an opcode, if it is an LED opcode at all
pub fn led_mode_from_opcode(op: u8) -> Option<LedMode> {
    match op {
        0x30 => Some(LedMode::Off),
        0x31 => Some(LedMode::On),
        0x32 => Some(LedMode::Pulse),
        0x33 => Some(LedMode::BlinkA),
        0x34 => Some(LedMode::BlinkB),
        _ => None,
    }
}
