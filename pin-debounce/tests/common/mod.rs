#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};
use embedded_hal_async::digital::Wait;
use pin_debounce::{DebounceState, Edge, EdgeSource, Polarity, PollingConfig, PollingDebouncer};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn ms(millis: u64) -> Instant {
    Instant::from_millis(millis)
}

/// Input pin whose level is set by the test through a shared handle
#[derive(Clone, Default)]
pub struct FakePin {
    level: Rc<Cell<bool>>,
    fail: Rc<Cell<bool>>,
}

impl FakePin {
    pub fn new(level: bool) -> Self {
        let pin = Self::default();
        pin.set(level);
        pin
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    /// Make every read fail until reset
    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl ErrorType for FakePin {
    type Error = ErrorKind;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(self.level.get())
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|level| !level)
    }
}

/// Edge source which records interrupt registration
#[derive(Clone, Default)]
pub struct FakeSource {
    listening: Rc<Cell<Option<Edge>>>,
    listen_calls: Rc<Cell<u32>>,
    unlisten_calls: Rc<Cell<u32>>,
}

impl FakeSource {
    pub fn listening(&self) -> Option<Edge> {
        self.listening.get()
    }

    pub fn listen_calls(&self) -> u32 {
        self.listen_calls.get()
    }

    pub fn unlisten_calls(&self) -> u32 {
        self.unlisten_calls.get()
    }
}

impl EdgeSource for FakeSource {
    fn listen(&mut self, edge: Edge) {
        self.listening.set(Some(edge));
        self.listen_calls.set(self.listen_calls.get() + 1);
    }

    fn unlisten(&mut self) {
        self.listening.set(None);
        self.unlisten_calls.set(self.unlisten_calls.get() + 1);
    }
}

/// Async pin which reports `edges` edges immediately, then fails
pub struct FakeWaitPin {
    pub edges: u32,
    pub waited: Option<Edge>,
}

impl FakeWaitPin {
    pub fn new(edges: u32) -> Self {
        Self { edges, waited: None }
    }

    fn next_edge(&mut self, edge: Edge) -> Result<(), ErrorKind> {
        self.waited = Some(edge);
        if self.edges == 0 {
            return Err(ErrorKind::Other);
        }
        self.edges -= 1;
        Ok(())
    }
}

impl ErrorType for FakeWaitPin {
    type Error = ErrorKind;
}

impl Wait for FakeWaitPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.next_edge(Edge::Rising)
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.next_edge(Edge::Falling)
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub fn polling_config(debounce_ms: u64, poll_ms: u64, polarity: Polarity) -> PollingConfig {
    PollingConfig {
        debounce_time: Duration::from_millis(debounce_ms),
        poll_interval: Duration::from_millis(poll_ms),
        polarity,
    }
}

/// Feed `(time_ms, level)` samples and collect the outcomes
pub fn feed<P: InputPin>(
    debouncer: &PollingDebouncer<P>,
    samples: &[(u64, bool)],
) -> Vec<DebounceState> {
    samples
        .iter()
        .map(|&(time, level)| debouncer.tick(level, ms(time)))
        .collect()
}
