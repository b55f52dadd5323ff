//! Polling debouncer.
//!
//! The input is sampled every poll interval. A sample that differs from the previous one becomes
//! the new candidate level and restarts the stability clock, so any bounce resets the timer. Once
//! the candidate differs from the stable level and has been held for the debounce time, it's
//! committed and exactly one press or release notification fires.

use core::cell::{Cell, RefCell};

use embassy_futures::select::select;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{Error as _, InputPin};

use super::DebounceState;
use crate::config::{ConfigError, PollingConfig, validate_poll_interval};
use crate::level::Polarity;
use crate::notification::Notification;
use crate::{NOTIFICATION_WAITERS, RawMutex};

/// Committed state of a [`PollingDebouncer`], captured at once.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollingSnapshot {
    /// Stable raw level
    pub level: bool,
    /// Stable level mapped through the polarity
    pub pressed: bool,
    /// When the stable level was committed
    pub last_transition: Instant,
    /// How long the previous stable level lasted
    pub last_stable_duration: Duration,
}

#[derive(Clone, Copy)]
struct PollState {
    /// Last raw sample, this is the candidate level
    current: bool,
    /// Committed level
    stable: bool,
    /// When `current` last changed
    stable_since: Instant,
    last_transition: Instant,
    last_stable_duration: Duration,
    debounce_time: Duration,
    poll_interval: Duration,
    running: bool,
}

/// Debouncer which samples an [`InputPin`] periodically.
///
/// The debouncer is shared by reference: one task drives [`PollingDebouncer::run`] while others
/// control it and wait for presses and releases.
///
/// ```ignore
/// static BUTTON: StaticCell<PollingDebouncer<Input<'static>>> = StaticCell::new();
///
/// #[embassy_executor::task]
/// async fn button_task(button: &'static PollingDebouncer<Input<'static>>) {
///     button.run().await
/// }
///
/// let button = BUTTON.init(PollingDebouncer::new(pin, PollingConfig::default()).unwrap());
/// button.start(Duration::from_millis(5)).unwrap();
/// spawner.must_spawn(button_task(button));
/// button.wait_for_press().await;
/// ```
pub struct PollingDebouncer<P: InputPin> {
    pin: Mutex<RawMutex, RefCell<P>>,
    state: Mutex<RawMutex, Cell<PollState>>,
    polarity: Polarity,
    /// Wakes the run loop when it's started or stopped
    control: Signal<RawMutex, ()>,
    pressed: Notification<NOTIFICATION_WAITERS>,
    released: Notification<NOTIFICATION_WAITERS>,
}

impl<P: InputPin> PollingDebouncer<P> {
    /// Create a debouncer bound to `pin`.
    ///
    /// The current pin level is taken as the initial stable level. If it can't be read, the input
    /// is assumed to be released.
    pub fn new(mut pin: P, config: PollingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let level = match pin.is_high() {
            Ok(level) => level,
            Err(e) => {
                warn!("Failed to read initial pin level: {:?}, assuming released", e.kind());
                config.polarity.released_level()
            }
        };
        let now = Instant::now();

        Ok(Self {
            pin: Mutex::new(RefCell::new(pin)),
            state: Mutex::new(Cell::new(PollState {
                current: level,
                stable: level,
                stable_since: now,
                last_transition: now,
                last_stable_duration: Duration::from_ticks(0),
                debounce_time: config.debounce_time,
                poll_interval: config.poll_interval,
                running: false,
            })),
            polarity: config.polarity,
            control: Signal::new(),
            pressed: Notification::new(),
            released: Notification::new(),
        })
    }

    /// Start sampling every `poll_interval`. Does nothing if already running.
    ///
    /// The candidate level restarts from the stable level, so a level seen before a previous
    /// [`stop`](Self::stop) has to be observed again before it's committed.
    pub fn start(&self, poll_interval: Duration) -> Result<(), ConfigError> {
        validate_poll_interval(poll_interval)?;

        let now = Instant::now();
        let started = self.state.lock(|cell| {
            let mut s = cell.get();
            if s.running {
                return false;
            }
            s.running = true;
            s.poll_interval = poll_interval;
            s.current = s.stable;
            s.stable_since = now;
            cell.set(s);
            true
        });

        if started {
            info!("Polling debouncer started, interval: {} us", poll_interval.as_micros());
            self.control.signal(());
        }
        Ok(())
    }

    /// Stop sampling. The committed state is kept, but no further transitions happen.
    ///
    /// Tasks waiting for a press or release are not woken.
    pub fn stop(&self) {
        let stopped = self.state.lock(|cell| {
            let mut s = cell.get();
            let was_running = s.running;
            s.running = false;
            cell.set(s);
            was_running
        });

        if stopped {
            info!("Polling debouncer stopped");
            self.control.signal(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock(|cell| cell.get().running)
    }

    /// The periodic sampling task.
    ///
    /// Never returns: idles while the debouncer is stopped and samples the pin every poll interval
    /// while it's running.
    pub async fn run(&self) {
        // Only the running flag matters on entry
        self.control.reset();

        loop {
            let Some(poll_interval) = self.state.lock(|cell| {
                let s = cell.get();
                s.running.then_some(s.poll_interval)
            }) else {
                self.control.wait().await;
                continue;
            };

            if let Some(level) = self.read_level() {
                self.tick(level, Instant::now());
            }

            // `stop` cuts the sleep short
            select(Timer::after(poll_interval), self.control.wait()).await;
        }
    }

    fn read_level(&self) -> Option<bool> {
        match self.pin.lock(|pin| pin.borrow_mut().is_high()) {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("Failed to read pin: {:?}, skipping this sample", e.kind());
                None
            }
        }
    }

    /// Evaluate one raw sample taken at `now`.
    ///
    /// Samples are ignored while the debouncer is stopped.
    pub fn tick(&self, level: bool, now: Instant) -> DebounceState {
        let (outcome, state) = self.state.lock(|cell| {
            let mut s = cell.get();
            if !s.running {
                return (DebounceState::Ignored, s);
            }
            let outcome = if level != s.current {
                // Any change restarts the stability clock
                s.current = level;
                s.stable_since = now;
                if level == s.stable {
                    DebounceState::Ignored
                } else {
                    DebounceState::InProgress
                }
            } else if s.current != s.stable {
                if now.saturating_duration_since(s.stable_since) >= s.debounce_time {
                    s.stable = s.current;
                    s.last_stable_duration = now.saturating_duration_since(s.last_transition);
                    s.last_transition = now;
                    DebounceState::Debounced
                } else {
                    DebounceState::InProgress
                }
            } else {
                DebounceState::Ignored
            };
            cell.set(s);
            (outcome, s)
        });

        if outcome == DebounceState::Debounced {
            if self.polarity.is_pressed(state.stable) {
                debug!("Pressed, released for {} ms", state.last_stable_duration.as_millis());
                self.pressed.set();
            } else {
                debug!("Released, pressed for {} ms", state.last_stable_duration.as_millis());
                self.released.set();
            }
        }
        outcome
    }

    /// Wait for the next committed press. Presses committed before this call don't count.
    pub async fn wait_for_press(&self) {
        self.pressed.wait().await
    }

    /// Wait for the next committed release. Releases committed before this call don't count.
    pub async fn wait_for_release(&self) {
        self.released.wait().await
    }

    pub fn snapshot(&self) -> PollingSnapshot {
        let s = self.state.lock(|cell| cell.get());
        PollingSnapshot {
            level: s.stable,
            pressed: self.polarity.is_pressed(s.stable),
            last_transition: s.last_transition,
            last_stable_duration: s.last_stable_duration,
        }
    }

    /// Debounced logical state
    pub fn is_pressed(&self) -> bool {
        self.snapshot().pressed
    }

    /// Debounced raw level
    pub fn level(&self) -> bool {
        self.snapshot().level
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn debounce_time(&self) -> Duration {
        self.state.lock(|cell| cell.get().debounce_time)
    }

    /// Change the debounce time. Takes effect from the next sample, committed transitions are kept.
    pub fn set_debounce_time(&self, debounce_time: Duration) {
        self.state.lock(|cell| {
            let mut s = cell.get();
            s.debounce_time = debounce_time;
            cell.set(s);
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.state.lock(|cell| cell.get().poll_interval)
    }

    /// How long the previous stable level lasted before the latest transition
    pub fn last_stable_duration(&self) -> Duration {
        self.snapshot().last_stable_duration
    }

    /// How long the current stable level has lasted at `now`
    pub fn stable_duration_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.snapshot().last_transition)
    }

    pub fn current_stable_duration(&self) -> Duration {
        self.stable_duration_at(Instant::now())
    }

    /// [`last_stable_duration`](Self::last_stable_duration) in seconds, which is the press length
    /// right after a release
    pub fn last_press_duration_s(&self) -> f32 {
        as_secs_f32(self.last_stable_duration())
    }

    /// [`current_stable_duration`](Self::current_stable_duration) in seconds
    pub fn current_press_duration_s(&self) -> f32 {
        as_secs_f32(self.current_stable_duration())
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin.into_inner().into_inner()
    }
}

fn as_secs_f32(duration: Duration) -> f32 {
    duration.as_micros() as f32 / 1_000_000.0
}
