//! Simulated console for development and tests
//!
//! Drives a real [`SamplerDevice`] with pattern-generated signals at the
//! acquisition cadence, behind the same [`ConsoleTransport`] the hardware
//! uses. The whole pipeline from protocol to poller to tuner runs
//! unmodified against it, so the installation can be developed and tested
//! away from the physical console.
//!
//! # Signal patterns
//!
//! - [`SignalPattern::Constant`] - fixed reading (deterministic, the test
//!   suite's workhorse)
//! - [`SignalPattern::Sweep`] - linear ramp between two readings, looping
//! - [`SignalPattern::Sine`] - sinusoidal wander around a center
//! - [`SignalPattern::Noisy`] - constant with uniform jitter
//!
//! # Controls
//!
//! [`SimulatedConsole::controls`] returns a [`SimControls`] handle sharing
//! the simulator state. Tests use it to retune signals mid-run, force a
//! deterministic number of acquisition ticks, and inspect the actuator
//! state the device has latched.

use crate::console::device::{ActuatorState, SamplerDevice};
use crate::console::transport::ConsoleTransport;
use crate::error::Result;
use crate::types::Channel;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Acquisition tick rate of the simulated device
pub const ACQUISITION_HZ: u64 = 500;

/// Upper bound on ticks replayed per transport call, so a long pause does
/// not turn into an unbounded catch-up loop
const MAX_CATCHUP_TICKS: u64 = 2000;

/// Generator for one channel's raw signal
#[derive(Debug, Clone, Copy)]
pub enum SignalPattern {
    /// Fixed reading
    Constant(u16),
    /// Linear ramp from one reading to another, looping every period
    Sweep { from: u16, to: u16, period_secs: f64 },
    /// Sinusoidal wander around a center value
    Sine {
        center: f64,
        amplitude: f64,
        frequency: f64,
    },
    /// Fixed reading with uniform jitter of +/- `spread`
    Noisy { center: u16, spread: u16 },
}

impl SignalPattern {
    fn sample(&self, t: f64, rng: &mut u64) -> u16 {
        match *self {
            SignalPattern::Constant(v) => v,
            SignalPattern::Sweep {
                from,
                to,
                period_secs,
            } => {
                let phase = (t / period_secs).fract();
                let from = f64::from(from);
                let to = f64::from(to);
                clamp_reading(from + (to - from) * phase)
            }
            SignalPattern::Sine {
                center,
                amplitude,
                frequency,
            } => clamp_reading(
                center + amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin(),
            ),
            SignalPattern::Noisy { center, spread } => {
                let jitter = (rand_simple(rng) - 0.5) * 2.0 * f64::from(spread);
                clamp_reading(f64::from(center) + jitter)
            }
        }
    }
}

fn clamp_reading(v: f64) -> u16 {
    v.round().clamp(0.0, 1023.0) as u16
}

/// xorshift64, good enough for jitter; the seed is fixed so noisy runs are
/// reproducible
fn rand_simple(state: &mut u64) -> f64 {
    let mut s = *state;
    s ^= s << 13;
    s ^= s >> 7;
    s ^= s << 17;
    *state = s;
    (s as f64) / (u64::MAX as f64)
}

#[derive(Debug)]
struct SimInner {
    device: SamplerDevice,
    tuner: SignalPattern,
    knob_a: SignalPattern,
    knob_b: SignalPattern,
    knob_c: SignalPattern,
    switch: SignalPattern,
    ticks_done: u64,
    rng: u64,
}

impl SimInner {
    fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            let t = self.ticks_done as f64 / ACQUISITION_HZ as f64;
            let tuner = self.tuner.sample(t, &mut self.rng);
            let knob_a = self.knob_a.sample(t, &mut self.rng);
            let knob_b = self.knob_b.sample(t, &mut self.rng);
            let knob_c = self.knob_c.sample(t, &mut self.rng);
            let switch = self.switch.sample(t, &mut self.rng);
            self.device.record(Channel::Tuner, tuner);
            self.device.record(Channel::KnobA, knob_a);
            self.device.record(Channel::KnobB, knob_b);
            self.device.record(Channel::KnobC, knob_c);
            self.device.record(Channel::Switch, switch);
            self.ticks_done += 1;
        }
    }

    fn set_pattern(&mut self, channel: Channel, pattern: SignalPattern) {
        match channel {
            Channel::Tuner => self.tuner = pattern,
            Channel::KnobA => self.knob_a = pattern,
            Channel::KnobB => self.knob_b = pattern,
            Channel::KnobC => self.knob_c = pattern,
            Channel::Switch => self.switch = pattern,
        }
    }
}

/// Shared control handle over a running simulator
#[derive(Clone)]
pub struct SimControls {
    inner: Arc<Mutex<SimInner>>,
}

impl SimControls {
    /// Replace the signal pattern of a channel
    pub fn set_pattern(&self, channel: Channel, pattern: SignalPattern) {
        self.inner.lock().unwrap().set_pattern(channel, pattern);
    }

    /// Run exactly `count` acquisition ticks now
    ///
    /// Tests use this instead of waiting for wall-clock time; `count`
    /// larger than the sample log capacity guarantees the logs are fully
    /// flushed with the current patterns.
    pub fn run_ticks(&self, count: u64) {
        self.inner.lock().unwrap().run_ticks(count);
    }

    /// Actuator state latched by the simulated device
    pub fn actuators(&self) -> ActuatorState {
        self.inner.lock().unwrap().device.actuators()
    }

    /// Bytes the device dropped to command-buffer back-pressure
    pub fn dropped_bytes(&self) -> u64 {
        self.inner.lock().unwrap().device.dropped_bytes()
    }
}

/// Simulated console transport
pub struct SimulatedConsole {
    inner: Arc<Mutex<SimInner>>,
    started: Instant,
}

impl SimulatedConsole {
    /// Create a simulator with quiet defaults: mid-range knobs, a tuner
    /// resting low on the dial, switch off
    ///
    /// Runs one acquisition tick immediately, mirroring the firmware whose
    /// sampling timer starts before the bus is answered, so the logs are
    /// never empty when the first snapshot request arrives.
    pub fn new() -> Self {
        let mut inner = SimInner {
            device: SamplerDevice::new(),
            tuner: SignalPattern::Constant(150),
            knob_a: SignalPattern::Constant(512),
            knob_b: SignalPattern::Constant(512),
            knob_c: SignalPattern::Constant(512),
            switch: SignalPattern::Constant(0),
            ticks_done: 0,
            rng: 0x9E37_79B9_7F4A_7C15,
        };
        inner.run_ticks(1);
        Self {
            inner: Arc::new(Mutex::new(inner)),
            started: Instant::now(),
        }
    }

    /// Builder-style pattern override
    pub fn with_pattern(self, channel: Channel, pattern: SignalPattern) -> Self {
        self.inner.lock().unwrap().set_pattern(channel, pattern);
        self
    }

    /// Control handle sharing this simulator's state
    pub fn controls(&self) -> SimControls {
        SimControls {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Replay the acquisition ticks that wall-clock time owes us
    fn advance(&self, inner: &mut SimInner) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let due = (elapsed * ACQUISITION_HZ as f64) as u64;
        let pending = due.saturating_sub(inner.ticks_done).min(MAX_CATCHUP_TICKS);
        inner.run_ticks(pending);
    }
}

impl Default for SimulatedConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleTransport for SimulatedConsole {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        self.advance(&mut inner);
        inner.device.receive(bytes);
        inner.device.process();
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        self.advance(&mut inner);
        Ok(inner.device.respond(buf))
    }

    fn describe(&self) -> String {
        "simulated console".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::protocol::{decode_snapshot, opcode, SNAPSHOT_WIRE_SIZE};

    #[test]
    fn test_constant_patterns_produce_exact_estimates() {
        let mut sim = SimulatedConsole::new()
            .with_pattern(Channel::Tuner, SignalPattern::Constant(470))
            .with_pattern(Channel::KnobA, SignalPattern::Constant(33));
        let controls = sim.controls();
        controls.run_ticks(100);

        sim.send(&[opcode::READ_SNAPSHOT]).unwrap();
        let mut buf = [0u8; SNAPSHOT_WIRE_SIZE];
        let n = sim.recv(&mut buf).unwrap();
        let snapshot = decode_snapshot(&buf[..n]).unwrap();

        assert_eq!(snapshot.tuner, 470);
        assert_eq!(snapshot.knob_a, 33);
        assert_eq!(snapshot.switch_level, 0);
    }

    #[test]
    fn test_noisy_signal_estimates_near_center() {
        let mut sim =
            SimulatedConsole::new().with_pattern(
                Channel::Tuner,
                SignalPattern::Noisy {
                    center: 500,
                    spread: 40,
                },
            );
        let controls = sim.controls();
        controls.run_ticks(200);

        sim.send(&[opcode::READ_SNAPSHOT]).unwrap();
        let mut buf = [0u8; SNAPSHOT_WIRE_SIZE];
        let n = sim.recv(&mut buf).unwrap();
        let snapshot = decode_snapshot(&buf[..n]).unwrap();

        // The trimmed mean sits close to the center despite the jitter
        assert!((i32::from(snapshot.tuner) - 500).abs() <= 10);
    }

    #[test]
    fn test_retuning_a_pattern_moves_the_estimate() {
        let mut sim =
            SimulatedConsole::new().with_pattern(Channel::Tuner, SignalPattern::Constant(200));
        let controls = sim.controls();
        controls.run_ticks(100);

        controls.set_pattern(Channel::Tuner, SignalPattern::Constant(800));
        controls.run_ticks(100);

        sim.send(&[opcode::READ_SNAPSHOT]).unwrap();
        let mut buf = [0u8; SNAPSHOT_WIRE_SIZE];
        let n = sim.recv(&mut buf).unwrap();
        assert_eq!(decode_snapshot(&buf[..n]).unwrap().tuner, 800);
    }

    #[test]
    fn test_actuator_commands_reach_the_device() {
        let mut sim = SimulatedConsole::new();
        let controls = sim.controls();

        sim.send(&[opcode::LIGHT_ON, opcode::BUZZ_BOOP]).unwrap();
        let state = controls.actuators();
        assert!(state.light);
        assert_eq!(state.boops, 1);
    }
}
