//! Edge-timed debouncer.
//!
//! Driven by edge interrupts instead of polling. An edge is accepted only if it arrives more than
//! the debounce time after the *previous interrupt*, accepted or not. A burst of bounces therefore
//! keeps pushing the window forward, and nothing is accepted until the input has been quiet for the
//! whole debounce time.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use embedded_hal_async::digital::Wait;

use crate::RawMutex;
use crate::config::EdgeTimedConfig;
use crate::level::{Edge, Polarity, resolve_state};

/// Interrupt registration of the underlying input.
///
/// When the interrupt fires, the platform's handler must call [`EdgeTimedDebouncer::on_interrupt`].
pub trait EdgeSource {
    /// Enable the interrupt for `edge`
    fn listen(&mut self, edge: Edge);
    /// Disable the interrupt
    fn unlisten(&mut self);
}

/// Edge source for inputs driven by [`EdgeTimedDebouncer::watch`], where the async HAL owns the
/// interrupt registration.
pub struct NoInterrupt;

impl EdgeSource for NoInterrupt {
    fn listen(&mut self, _edge: Edge) {}

    fn unlisten(&mut self) {}
}

/// Debounced state and the timestamp of the edge that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeSnapshot {
    pub pressed: bool,
    /// Time of the latest accepted edge in microseconds, 0 if there was none yet
    pub timestamp_us: u64,
}

#[derive(Clone, Copy)]
struct EdgeState {
    /// Time of the previous interrupt, accepted or not
    last_interrupt: Option<Instant>,
    pressed: bool,
    timestamp_us: u64,
    started: bool,
}

/// Debouncer fed from edge interrupts.
///
/// Put it in a `static` so that the interrupt handler can reach it:
///
/// ```ignore
/// type Button = EdgeTimedDebouncer<ButtonIrq>;
/// static BUTTON: Mutex<CriticalSectionRawMutex, RefCell<Option<Button>>> = ...;
///
/// #[interrupt]
/// fn GPIO() {
///     BUTTON.lock(|b| {
///         if let Some(b) = b.borrow().as_ref() {
///             b.on_interrupt();
///         }
///     });
/// }
/// ```
pub struct EdgeTimedDebouncer<S: EdgeSource> {
    source: Mutex<RawMutex, RefCell<S>>,
    /// State and timestamp always change together, in one critical section
    state: Mutex<RawMutex, Cell<EdgeState>>,
    /// Latest accepted timestamp, overwritten if nobody took the previous one
    event: Signal<RawMutex, u64>,
    debounce_time: Duration,
    polarity: Polarity,
    trigger_edge: Edge,
}

impl<S: EdgeSource> EdgeTimedDebouncer<S> {
    pub fn new(source: S, config: EdgeTimedConfig) -> Self {
        Self {
            source: Mutex::new(RefCell::new(source)),
            state: Mutex::new(Cell::new(EdgeState {
                last_interrupt: None,
                pressed: false,
                timestamp_us: 0,
                started: false,
            })),
            event: Signal::new(),
            debounce_time: config.debounce_time,
            polarity: config.polarity,
            trigger_edge: config.trigger_edge(),
        }
    }

    /// Register the interrupt for the trigger edge. Does nothing if already started.
    pub fn start(&self) {
        let started = self.state.lock(|cell| {
            let mut s = cell.get();
            if s.started {
                return false;
            }
            s.started = true;
            cell.set(s);
            true
        });

        if started {
            self.source.lock(|source| source.borrow_mut().listen(self.trigger_edge));
            info!("Edge-timed debouncer listening on {:?} edge", self.trigger_edge);
        }
    }

    /// Deregister the interrupt. Interrupts arriving afterwards are ignored.
    ///
    /// A task blocked in [`wait_for_event`](Self::wait_for_event) is not woken, wrap the wait in
    /// `embassy_time::with_timeout` if it must not block forever.
    pub fn stop(&self) {
        let stopped = self.state.lock(|cell| {
            let mut s = cell.get();
            let was_started = s.started;
            s.started = false;
            cell.set(s);
            was_started
        });

        if stopped {
            self.source.lock(|source| source.borrow_mut().unlisten());
            info!("Edge-timed debouncer stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock(|cell| cell.get().started)
    }

    /// Interrupt handler body for the configured trigger edge.
    ///
    /// Returns whether the edge was accepted.
    pub fn on_interrupt(&self) -> bool {
        self.on_edge_at(self.trigger_edge, Instant::now())
    }

    /// Like [`on_interrupt`](Self::on_interrupt), for sources which report the edge that fired.
    pub fn on_edge(&self, edge: Edge) -> bool {
        self.on_edge_at(edge, Instant::now())
    }

    /// Handle `edge` observed at `now`.
    ///
    /// Never blocks and never fails. A `now` earlier than the previous interrupt counts as no time
    /// elapsed.
    pub fn on_edge_at(&self, edge: Edge, now: Instant) -> bool {
        let accepted = self.state.lock(|cell| {
            let mut s = cell.get();
            if !s.started {
                return None;
            }

            let accepted = match s.last_interrupt {
                None => true,
                Some(prev) => {
                    let elapsed = now.saturating_duration_since(prev);
                    elapsed.as_millis() > self.debounce_time.as_millis()
                }
            };
            if accepted {
                s.pressed = resolve_state(edge, self.polarity);
                s.timestamp_us = now.as_micros();
            }
            // Every interrupt restarts the refractory window
            s.last_interrupt = Some(now);
            cell.set(s);
            Some(accepted)
        });

        match accepted {
            Some(true) => {
                self.event.signal(now.as_micros());
                true
            }
            Some(false) => {
                trace!("Edge {:?} rejected at {} us", edge, now.as_micros());
                false
            }
            None => false,
        }
    }

    /// Wait for the next accepted edge and return its timestamp in microseconds.
    ///
    /// If edges were accepted while nobody was waiting, returns the latest one immediately.
    pub async fn wait_for_event(&self) -> u64 {
        self.event.wait().await
    }

    /// Whether an accepted edge is waiting to be taken by [`wait_for_event`](Self::wait_for_event)
    pub fn has_pending_event(&self) -> bool {
        self.event.signaled()
    }

    /// Debounced logical state
    pub fn state(&self) -> bool {
        self.snapshot().pressed
    }

    /// Timestamp of the latest accepted edge in microseconds
    pub fn event_timestamp(&self) -> u64 {
        self.snapshot().timestamp_us
    }

    pub fn snapshot(&self) -> EdgeSnapshot {
        let s = self.state.lock(|cell| cell.get());
        EdgeSnapshot {
            pressed: s.pressed,
            timestamp_us: s.timestamp_us,
        }
    }

    pub fn debounce_time(&self) -> Duration {
        self.debounce_time
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn trigger_edge(&self) -> Edge {
        self.trigger_edge
    }

    /// Feed edges from an async HAL pin while the debouncer is started.
    ///
    /// Use this with [`NoInterrupt`] when the HAL registers the interrupt itself. Returns once the
    /// debouncer has been stopped and another edge arrived, or when waiting on the pin fails.
    pub async fn watch<W: Wait>(&self, pin: &mut W) -> Result<(), W::Error> {
        while self.is_started() {
            match self.trigger_edge {
                Edge::Falling => pin.wait_for_falling_edge().await?,
                Edge::Rising => pin.wait_for_rising_edge().await?,
            }
            self.on_interrupt();
        }
        Ok(())
    }

    /// Give the source back
    pub fn release(self) -> S {
        self.source.into_inner().into_inner()
    }
}
