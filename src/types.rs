//! Core data types for the radiodial pipeline
//!
//! This module contains the vocabulary shared between the console side
//! (sampling device, transport, poller) and the tuning side (tuner,
//! feedback policy).
//!
//! # Main Types
//!
//! - [`Channel`] - Identity of a console input (tuner pot, knobs, switch)
//! - [`Snapshot`] - One atomic view of every input channel
//! - [`TuneStatus`] - Position of the smoothed reading relative to the
//!   selected station
//! - [`LedMode`] / [`BuzzKind`] - Actuator command vocabulary
//! - [`PollStats`] - Counters maintained by the polling loop

use serde::{Deserialize, Serialize};

/// Identity of one console input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The main tuning potentiometer
    Tuner,
    /// Auxiliary knob A
    KnobA,
    /// Auxiliary knob B
    KnobB,
    /// Auxiliary knob C
    KnobC,
    /// The rotary switch (two detents in the current console)
    Switch,
}

/// One atomic, fully-formed read of all console inputs
///
/// Exactly one live snapshot exists on the controller side at a time; the
/// poller replaces it wholesale, never field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tuning potentiometer estimate (0-1023)
    pub tuner: u16,
    /// Knob A estimate
    pub knob_a: u16,
    /// Knob B estimate
    pub knob_b: u16,
    /// Knob C estimate
    pub knob_c: u16,
    /// Rotary switch level
    pub switch_level: u8,
}

/// LED animation mode latched on the sampling device
///
/// Waveform generation happens on the device; the controller only selects
/// the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LedMode {
    /// Both LEDs dark
    Off,
    /// Both LEDs fully lit
    On,
    /// Both LEDs pulsing together
    Pulse,
    /// LED A blinking, B dark (power-on state of the device)
    #[default]
    BlinkA,
    /// LED B blinking, A dark
    BlinkB,
}

/// Haptic pattern requested from the vibration motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuzzKind {
    /// Two short pulses, played when the dial nears a station
    BeepBeep,
    /// One short pulse, played when the dial locks onto a station
    Boop,
}

/// Position of the smoothed reading relative to the selected station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TuneStatus {
    /// Reading is well below the near band
    FarBelow,
    /// Reading is inside the near band, below the target
    Below,
    /// Reading is inside the tightest band around the target
    Tuned,
    /// Reading is inside the near band, above the target
    Above,
    /// Reading is well above the near band
    FarAbove,
    /// No station selected yet (empty station table)
    #[default]
    None,
}

impl TuneStatus {
    /// True for the two far states
    pub fn is_far(&self) -> bool {
        matches!(self, TuneStatus::FarAbove | TuneStatus::FarBelow)
    }

    /// True for the two near (but not tuned) states
    pub fn is_near(&self) -> bool {
        matches!(self, TuneStatus::Above | TuneStatus::Below)
    }
}

/// Counters maintained by the polling loop
///
/// A failed cycle is one where the transport write or read failed, or the
/// response was shorter than the wire record; the previous snapshot stays
/// live in that case.
#[derive(Debug, Clone, Default)]
pub struct PollStats {
    /// Cycles that produced a fresh snapshot
    pub successful_cycles: u64,
    /// Cycles skipped because of a transport failure or short read
    pub failed_cycles: u64,
    /// Actuator command bytes delivered to the device
    pub commands_sent: u64,
    /// Total time spent in successful cycles, in microseconds
    pub total_cycle_time_us: u64,
    /// Duration of the most recent successful cycle, in microseconds
    pub last_cycle_time_us: u64,
    /// Events dropped because the event channel was full
    pub dropped_events: u64,
}

impl PollStats {
    /// Average successful cycle time in microseconds
    pub fn avg_cycle_time_us(&self) -> f64 {
        if self.successful_cycles == 0 {
            0.0
        } else {
            self.total_cycle_time_us as f64 / self.successful_cycles as f64
        }
    }

    /// Fraction of cycles that produced a snapshot, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_cycles + self.failed_cycles;
        if total == 0 {
            100.0
        } else {
            (self.successful_cycles as f64 / total as f64) * 100.0
        }
    }

    /// Record a successful cycle
    pub fn record_success(&mut self, cycle_time_us: u64, commands: u64) {
        self.successful_cycles += 1;
        self.total_cycle_time_us += cycle_time_us;
        self.last_cycle_time_us = cycle_time_us;
        self.commands_sent += commands;
    }

    /// Record a skipped cycle
    pub fn record_failure(&mut self) {
        self.failed_cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_stats_rates() {
        let mut stats = PollStats::default();
        assert_eq!(stats.success_rate(), 100.0);
        assert_eq!(stats.avg_cycle_time_us(), 0.0);

        stats.record_success(100, 1);
        stats.record_success(300, 0);
        stats.record_failure();

        assert_eq!(stats.successful_cycles, 2);
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.commands_sent, 1);
        assert_eq!(stats.avg_cycle_time_us(), 200.0);
        assert!((stats.success_rate() - 66.6666).abs() < 0.01);
    }

    #[test]
    fn test_status_classification() {
        assert!(TuneStatus::FarAbove.is_far());
        assert!(TuneStatus::FarBelow.is_far());
        assert!(TuneStatus::Above.is_near());
        assert!(TuneStatus::Below.is_near());
        assert!(!TuneStatus::Tuned.is_far());
        assert!(!TuneStatus::Tuned.is_near());
        assert!(!TuneStatus::None.is_near());
    }
}
