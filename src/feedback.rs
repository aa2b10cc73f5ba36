//! Haptic feedback policy
//!
//! Watches tune status transitions and decides when the console should
//! buzz. Two rules, both about not being annoying:
//!
//! - Locking onto a station always earns a boop.
//! - Getting *near* a station earns a beep-beep, but only when coming in
//!   from far away (not on the way out of tuned) and only if the status
//!   has been stable for the debounce window; an operator wiggling the
//!   knob at a band edge gets one buzz, not a drumroll.
//!
//! The clock is passed in by the caller, so the policy is deterministic
//! under test.

use crate::config::FeedbackConfig;
use crate::tuner::Tuner;
use crate::types::{BuzzKind, TuneStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status-transition feedback policy
#[derive(Debug)]
pub struct TuningFeedback {
    debounce: Duration,
    prev_status: TuneStatus,
    last_changed_at: Option<Instant>,
}

impl TuningFeedback {
    /// Create a policy that has seen no status yet
    pub fn new(cfg: FeedbackConfig) -> Self {
        Self {
            debounce: Duration::from_millis(cfg.debounce_ms),
            prev_status: TuneStatus::None,
            last_changed_at: None,
        }
    }

    /// Feed the current status; returns the buzz to play, if any
    ///
    /// An unchanged status is a no-op and does not touch the change
    /// timestamp. The very first transition is always debounce-eligible.
    pub fn on_status(&mut self, status: TuneStatus, now: Instant) -> Option<BuzzKind> {
        if status == self.prev_status {
            return None;
        }

        let debounced = self
            .last_changed_at
            .map_or(true, |at| now.duration_since(at) > self.debounce);

        let buzz = match status {
            TuneStatus::Tuned => Some(BuzzKind::Boop),
            TuneStatus::Above | TuneStatus::Below
                if self.prev_status != TuneStatus::Tuned && debounced =>
            {
                Some(BuzzKind::BeepBeep)
            }
            _ => None,
        };

        self.prev_status = status;
        self.last_changed_at = Some(now);
        buzz
    }
}

/// Observer wiring for the poll cycle: tuner update, then feedback
///
/// Registered with the poller so the chain from smoothing through the
/// state machine to the feedback decision runs once per poll cycle. The buzz the
/// policy picks is returned to the poller, which latches it for delivery
/// on the next cycle.
pub struct TuningPipeline {
    tuner: Arc<Tuner>,
    feedback: TuningFeedback,
}

impl TuningPipeline {
    /// Wire a shared tuner to a feedback policy
    pub fn new(tuner: Arc<Tuner>, feedback: TuningFeedback) -> Self {
        Self { tuner, feedback }
    }
}

impl crate::console::ValueObserver for TuningPipeline {
    fn on_reading(&mut self, value: u16) -> Option<BuzzKind> {
        self.tuner.update(value);
        let (_, status) = self.tuner.get_status();
        self.feedback.on_status(status, Instant::now())
    }
}
