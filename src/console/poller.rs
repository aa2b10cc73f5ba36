//! Polling worker and thread-safe console handle
//!
//! The poller owns the transport and runs on its own schedule (20 ms by
//! default), independent of whatever cadence the rendering side runs at.
//! Each cycle delivers the latched actuator commands, requests a fresh
//! snapshot, atomically replaces the live one, and hands the tuner
//! channel's estimate to the registered observer.
//!
//! # Locking discipline
//!
//! One mutex guards the live snapshot, the outbound command latch and the
//! counters. Critical sections are copy-in/copy-out only; transport I/O
//! always happens with the lock released. The observer is the single
//! exception: it runs inside the critical section of a successful cycle,
//! so its work must stay short; the tuner update qualifies.
//!
//! # Failure handling
//!
//! A failed write, read or short response skips the cycle: the previous
//! snapshot stays live, undelivered commands return to the latch (unless
//! something newer was latched meanwhile), the failure is counted and the
//! loop carries on. Nothing propagates out of the polling thread; the
//! installation runs unattended.

use crate::console::protocol::{self, opcode, SNAPSHOT_WIRE_SIZE};
use crate::console::transport::ConsoleTransport;
use crate::error::Result;
use crate::types::{BuzzKind, LedMode, PollStats, Snapshot};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Capacity of the poller event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How often the poller publishes a stats event
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Observer of the primary tuned channel
///
/// Invoked once per successful poll cycle with the tuner estimate, inside
/// the cycle's critical section, so implementations must not block. A
/// returned [`BuzzKind`] is latched as a haptic command and delivered on
/// the next cycle.
pub trait ValueObserver: Send {
    /// React to a fresh tuner reading
    fn on_reading(&mut self, value: u16) -> Option<BuzzKind>;
}

impl<F> ValueObserver for F
where
    F: FnMut(u16) -> Option<BuzzKind> + Send,
{
    fn on_reading(&mut self, value: u16) -> Option<BuzzKind> {
        self(value)
    }
}

/// Out-of-band notifications from the polling thread
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// Periodic counters
    Stats(PollStats),
    /// A cycle was skipped; the previous snapshot stays live
    TransportError(String),
    /// The polling thread has exited
    Shutdown,
}

/// Latch of undelivered actuator commands
///
/// Commands are latched, not queued: a newer command of the same kind
/// overwrites an older undelivered one. The whole latch drains at the
/// start of the next poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandLatch {
    /// Pending light state
    pub light: Option<bool>,
    /// Pending LED mode
    pub led: Option<LedMode>,
    /// Pending haptic pattern
    pub buzz: Option<BuzzKind>,
}

impl CommandLatch {
    /// Number of latched commands
    pub fn len(&self) -> usize {
        usize::from(self.light.is_some())
            + usize::from(self.led.is_some())
            + usize::from(self.buzz.is_some())
    }

    /// True when nothing is latched
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the latch, leaving it empty
    pub fn take(&mut self) -> CommandLatch {
        std::mem::take(self)
    }

    /// Append the latched command opcodes in fixed order
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        if let Some(on) = self.light {
            out.push(protocol::light_opcode(on));
        }
        if let Some(mode) = self.led {
            out.push(protocol::led_opcode(mode));
        }
        if let Some(kind) = self.buzz {
            out.push(protocol::buzz_opcode(kind));
        }
    }

    /// Put back commands that failed to deliver
    ///
    /// A command latched after the failed cycle started is newer and wins;
    /// only still-empty slots are restored.
    pub fn restore_undelivered(&mut self, undelivered: CommandLatch) {
        self.light = self.light.or(undelivered.light);
        self.led = self.led.or(undelivered.led);
        self.buzz = self.buzz.or(undelivered.buzz);
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: Option<Snapshot>,
    latch: CommandLatch,
    stats: PollStats,
}

#[derive(Debug)]
struct SharedState {
    inner: Mutex<Inner>,
    running: AtomicBool,
}

/// Thread-safe handle onto a running poller
///
/// Safe to use from any thread; every method is bounded by the
/// copy-in/copy-out critical section.
pub struct ConsoleHandle {
    shared: Arc<SharedState>,
    events: Receiver<ConsoleEvent>,
}

impl ConsoleHandle {
    /// Last-known snapshot, or `None` before the first successful cycle
    pub fn get_values(&self) -> Option<Snapshot> {
        self.shared.inner.lock().unwrap().snapshot
    }

    /// Latch a light command for the next cycle
    pub fn set_light(&self, on: bool) {
        self.shared.inner.lock().unwrap().latch.light = Some(on);
    }

    /// Latch an LED mode command for the next cycle
    pub fn set_led(&self, mode: LedMode) {
        self.shared.inner.lock().unwrap().latch.led = Some(mode);
    }

    /// Latch a haptic command for the next cycle
    pub fn buzz(&self, kind: BuzzKind) {
        self.shared.inner.lock().unwrap().latch.buzz = Some(kind);
    }

    /// Copy of the poll counters
    pub fn stats(&self) -> PollStats {
        self.shared.inner.lock().unwrap().stats.clone()
    }

    /// True until shutdown is requested or the polling thread exits
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Ask the polling thread to exit after its current cycle
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }

    /// Receive one pending event without blocking
    pub fn try_recv_event(&self) -> Option<ConsoleEvent> {
        self.events.try_recv().ok()
    }

    /// Receive all pending events
    pub fn drain_events(&self) -> Vec<ConsoleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// The polling worker
///
/// Construct with [`Poller::new`], register an observer, then either call
/// [`Poller::spawn`] for the normal threaded mode or drive
/// [`Poller::poll_once`] manually (tests do the latter for determinism).
pub struct Poller {
    transport: Box<dyn ConsoleTransport>,
    shared: Arc<SharedState>,
    observer: Option<Box<dyn ValueObserver>>,
    events: Sender<ConsoleEvent>,
    poll_interval: Duration,
    last_cycle: Instant,
    last_stats_emit: Instant,
}

impl Poller {
    /// Create a poller and the handle that talks to it
    pub fn new(
        transport: Box<dyn ConsoleTransport>,
        poll_interval: Duration,
    ) -> (Self, ConsoleHandle) {
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(SharedState {
            inner: Mutex::new(Inner::default()),
            running: AtomicBool::new(true),
        });

        let poller = Self {
            transport,
            shared: Arc::clone(&shared),
            observer: None,
            events: event_tx,
            poll_interval,
            last_cycle: Instant::now(),
            last_stats_emit: Instant::now(),
        };
        let handle = ConsoleHandle {
            shared,
            events: event_rx,
        };
        (poller, handle)
    }

    /// Register the observer of the tuner channel
    pub fn set_observer(&mut self, observer: Box<dyn ValueObserver>) {
        self.observer = Some(observer);
    }

    /// Run one poll cycle
    ///
    /// On failure the cycle is skipped as described in the module docs and
    /// the error is returned for the caller's benefit; [`Poller::run`]
    /// only logs it.
    pub fn poll_once(&mut self) -> Result<()> {
        let cycle_start = Instant::now();

        let outbound = self.shared.inner.lock().unwrap().latch.take();
        let command_count = outbound.len() as u64;

        match self.exchange(&outbound) {
            Ok(snapshot) => {
                let mut inner = self.shared.inner.lock().unwrap();
                inner.snapshot = Some(snapshot);
                if let Some(observer) = self.observer.as_mut() {
                    if let Some(kind) = observer.on_reading(snapshot.tuner) {
                        inner.latch.buzz = Some(kind);
                    }
                }
                inner
                    .stats
                    .record_success(cycle_start.elapsed().as_micros() as u64, command_count);
                Ok(())
            }
            Err(e) => {
                {
                    let mut inner = self.shared.inner.lock().unwrap();
                    inner.latch.restore_undelivered(outbound);
                    inner.stats.record_failure();
                }
                self.emit(ConsoleEvent::TransportError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Run the polling loop until shutdown
    pub fn run(mut self) {
        tracing::info!("Console poller started on {}", self.transport.describe());

        while self.shared.running.load(Ordering::SeqCst) {
            if let Err(e) = self.poll_once() {
                tracing::warn!("Poll cycle skipped: {}", e);
            }

            if self.last_stats_emit.elapsed() >= STATS_INTERVAL {
                let stats = self.shared.inner.lock().unwrap().stats.clone();
                self.emit(ConsoleEvent::Stats(stats));
                self.last_stats_emit = Instant::now();
            }

            self.rate_limit();
        }

        let _ = self.events.send(ConsoleEvent::Shutdown);
        tracing::info!("Console poller stopped");
    }

    /// Spawn the polling loop on a dedicated thread
    pub fn spawn(self) -> Result<std::thread::JoinHandle<()>> {
        let handle = std::thread::Builder::new()
            .name("console-poller".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    /// Deliver commands, request and decode a snapshot
    ///
    /// All transport I/O of a cycle lives here, outside the lock.
    fn exchange(&mut self, outbound: &CommandLatch) -> Result<Snapshot> {
        let mut request = Vec::with_capacity(4);
        outbound.encode_into(&mut request);
        request.push(opcode::READ_SNAPSHOT);
        self.transport.send(&request)?;

        let mut response = [0u8; SNAPSHOT_WIRE_SIZE];
        let n = self.transport.recv(&mut response)?;
        protocol::decode_snapshot(&response[..n])
    }

    fn emit(&self, event: ConsoleEvent) {
        if self.events.try_send(event).is_err() {
            self.shared.inner.lock().unwrap().stats.dropped_events += 1;
        }
    }

    /// Sleep out the remainder of the poll interval
    fn rate_limit(&mut self) {
        let elapsed = self.last_cycle.elapsed();
        if elapsed < self.poll_interval {
            std::thread::sleep(self.poll_interval - elapsed);
        }
        self.last_cycle = Instant::now();
    }
}
