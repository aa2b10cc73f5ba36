//! Hysteretic tuning state machine
//!
//! The tuner turns a stream of smoothed tuner-pot readings into a
//! `(station index, status)` pair. Two layers of hysteresis keep the pair
//! stable under sensor jitter:
//!
//! - **Station identity**: the selection only moves to the globally
//!   nearest station when that station is more than `switch_margin` closer
//!   than the current one, so the dial cannot flap between two stations
//!   around their midpoint.
//! - **Status**: enter thresholds (`tuned_enter`, `near_enter`) are
//!   tighter than the matching leave thresholds (`tuned_leave`,
//!   `near_leave`), so a reading resting exactly on a band edge cannot
//!   chatter between states.
//!
//! The dial frequency mapping (`value_to_frequency` and its inverse) is a
//! fixed three-point Lagrange interpolation through measured calibration
//! pairs. It exists for display and station seeding only; tuning decisions
//! work on raw values.

use crate::config::TunerConfig;
use crate::types::TuneStatus;
use std::sync::Mutex;

/// State owned by the update step, behind the tuner's mutex
#[derive(Debug)]
struct TunerInner {
    /// Station targets as raw values, in registration order
    stations: Vec<i32>,
    /// Median filter ring
    smooth_buf: Vec<i32>,
    smooth_cursor: usize,
    /// Currently selected station, if any
    station: Option<usize>,
    status: TuneStatus,
}

/// The tuning state machine
///
/// Shared as `Arc<Tuner>` between the polling thread (which calls
/// [`update`]) and whoever displays or acts on [`get_status`].
///
/// [`update`]: Tuner::update
/// [`get_status`]: Tuner::get_status
#[derive(Debug)]
pub struct Tuner {
    cfg: TunerConfig,
    inner: Mutex<TunerInner>,
}

impl Tuner {
    /// Create a tuner with an empty station table
    pub fn new(cfg: TunerConfig) -> Self {
        let window = cfg.smoothing_window.max(1);
        Self {
            inner: Mutex::new(TunerInner {
                stations: Vec::new(),
                smooth_buf: vec![0; window],
                smooth_cursor: 0,
                station: None,
                status: TuneStatus::None,
            }),
            cfg,
        }
    }

    /// Append a station at a raw target value
    ///
    /// Registration order defines the station index reported by
    /// [`get_status`]. All stations are expected before the first
    /// [`update`]; the table is append-only.
    ///
    /// [`get_status`]: Tuner::get_status
    /// [`update`]: Tuner::update
    pub fn add_station(&self, target: i32) {
        let mut inner = self.inner.lock().unwrap();
        inner.stations.push(target);
        tracing::debug!(
            "Station {} added at value {}",
            inner.stations.len() - 1,
            target
        );
    }

    /// Append a station by its dial frequency (tenths of MHz)
    pub fn add_station_frequency(&self, freq_tenths: i32) {
        let target = self.frequency_to_value(freq_tenths);
        tracing::debug!(
            "Station {:.1} MHz maps to value {}",
            freq_tenths as f64 * 0.1,
            target
        );
        self.add_station(i32::from(target));
    }

    /// Number of registered stations
    pub fn station_count(&self) -> usize {
        self.inner.lock().unwrap().stations.len()
    }

    /// Current `(station index, status)` pair
    pub fn get_status(&self) -> (Option<usize>, TuneStatus) {
        let inner = self.inner.lock().unwrap();
        (inner.station, inner.status)
    }

    /// Feed one raw reading through smoothing and the state machine
    ///
    /// With an empty station table this only advances the smoothing
    /// filter; the status stays [`TuneStatus::None`].
    pub fn update(&self, raw: u16) {
        let mut inner = self.inner.lock().unwrap();
        let val = Self::smooth(&mut inner, i32::from(raw));

        if inner.stations.is_empty() {
            return;
        }

        // Distance to the currently selected station; unselected counts as
        // infinitely far so the first update always locks onto something.
        let mut dist = match inner.station {
            Some(ix) => (inner.stations[ix] - val).abs(),
            None => i32::MAX,
        };

        // Globally nearest station, first occurrence winning ties
        let (min_ix, min_dist) = inner
            .stations
            .iter()
            .enumerate()
            .map(|(ix, &target)| (ix, (target - val).abs()))
            .min_by_key(|&(_, d)| d)
            .expect("station table is non-empty");

        // Station switch rule: only move if the rival is clearly closer
        if min_dist < dist.saturating_sub(self.cfg.switch_margin) {
            inner.station = Some(min_ix);
            inner.status = if inner.stations[min_ix] >= val {
                TuneStatus::FarAbove
            } else {
                TuneStatus::FarBelow
            };
            dist = min_dist;
        }

        let ix = match inner.station {
            Some(ix) => ix,
            None => return,
        };
        let delta = val - inner.stations[ix];
        let last_status = inner.status;

        // Status hysteresis around the selected station
        inner.status = match inner.status {
            TuneStatus::FarAbove | TuneStatus::FarBelow => {
                if dist <= self.cfg.tuned_enter {
                    TuneStatus::Tuned
                } else if dist <= self.cfg.near_enter {
                    near_status(delta)
                } else {
                    inner.status
                }
            }
            TuneStatus::Above | TuneStatus::Below => {
                if dist >= self.cfg.near_leave {
                    far_status(delta)
                } else if dist <= self.cfg.tuned_enter {
                    TuneStatus::Tuned
                } else {
                    inner.status
                }
            }
            TuneStatus::Tuned => {
                if dist >= self.cfg.near_leave {
                    far_status(delta)
                } else if dist >= self.cfg.tuned_leave {
                    near_status(delta)
                } else {
                    TuneStatus::Tuned
                }
            }
            TuneStatus::None => inner.status,
        };

        if last_status != inner.status {
            tracing::debug!(
                "Status {:?} -> {:?} at dist {}",
                last_status,
                inner.status,
                dist
            );
        }
    }

    /// Median filter over the most recent readings
    fn smooth(inner: &mut TunerInner, val: i32) -> i32 {
        let cursor = inner.smooth_cursor;
        inner.smooth_buf[cursor] = val;
        inner.smooth_cursor = (cursor + 1) % inner.smooth_buf.len();

        let mut sorted = inner.smooth_buf.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    /// Dial frequency (tenths of MHz) shown at a raw value
    ///
    /// Quadratic Lagrange interpolation through the three calibration
    /// pairs; exact at those points, approximate elsewhere. Display only.
    pub fn value_to_frequency(&self, value: u16) -> i32 {
        let [p1, p2, p3] = self.cfg.calibration;
        let mhz = lagrange(f64::from(value), (p1.value, p1.mhz), (p2.value, p2.mhz), (p3.value, p3.mhz));
        (mhz * 10.0).round() as i32
    }

    /// Raw value sitting under a dial frequency (tenths of MHz)
    pub fn frequency_to_value(&self, freq_tenths: i32) -> u16 {
        let [p1, p2, p3] = self.cfg.calibration;
        let mhz = f64::from(freq_tenths) * 0.1;
        let value = lagrange(mhz, (p1.mhz, p1.value), (p2.mhz, p2.value), (p3.mhz, p3.value));
        value.round().clamp(0.0, f64::from(u16::MAX)) as u16
    }
}

fn near_status(delta: i32) -> TuneStatus {
    if delta > 0 {
        TuneStatus::Above
    } else {
        TuneStatus::Below
    }
}

fn far_status(delta: i32) -> TuneStatus {
    if delta > 0 {
        TuneStatus::FarAbove
    } else {
        TuneStatus::FarBelow
    }
}

/// Quadratic Lagrange interpolation through three (x, y) pairs
fn lagrange(x: f64, (x1, y1): (f64, f64), (x2, y2): (f64, f64), (x3, y3): (f64, f64)) -> f64 {
    y1 * ((x - x2) * (x - x3)) / ((x1 - x2) * (x1 - x3))
        + y2 * ((x - x1) * (x - x3)) / ((x2 - x1) * (x2 - x3))
        + y3 * ((x - x1) * (x - x2)) / ((x3 - x1) * (x3 - x2))
}
