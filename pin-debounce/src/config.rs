use core::fmt;

use embassy_time::Duration;

use crate::level::{Edge, Polarity};

/// Default stability window of the polling debouncer
pub const DEFAULT_POLL_DEBOUNCE_TIME: Duration = Duration::from_millis(10);
/// Default sampling period of the polling debouncer
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Default refractory window of the edge-timed debouncer
pub const DEFAULT_EDGE_DEBOUNCE_TIME: Duration = Duration::from_millis(200);

/// Invalid debouncer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The poll interval must be longer than zero
    ZeroPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPollInterval => f.write_str("poll interval must be greater than zero"),
        }
    }
}

/// Config for [`PollingDebouncer`](crate::PollingDebouncer)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollingConfig {
    /// How long a new level must be held before it's committed. Adjustable at runtime.
    pub debounce_time: Duration,
    /// Sampling period of the run loop
    pub poll_interval: Duration,
    pub polarity: Polarity,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            debounce_time: DEFAULT_POLL_DEBOUNCE_TIME,
            poll_interval: DEFAULT_POLL_INTERVAL,
            polarity: Polarity::ActiveLow,
        }
    }
}

impl PollingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_poll_interval(self.poll_interval)
    }
}

pub(crate) fn validate_poll_interval(poll_interval: Duration) -> Result<(), ConfigError> {
    if poll_interval == Duration::from_ticks(0) {
        return Err(ConfigError::ZeroPollInterval);
    }
    Ok(())
}

/// Config for [`EdgeTimedDebouncer`](crate::EdgeTimedDebouncer)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeTimedConfig {
    /// Minimum spacing to the previous interrupt for an edge to be accepted
    pub debounce_time: Duration,
    pub polarity: Polarity,
    /// Edge to listen on. `None` means the press edge of `polarity`.
    pub trigger_edge: Option<Edge>,
}

impl Default for EdgeTimedConfig {
    fn default() -> Self {
        Self {
            debounce_time: DEFAULT_EDGE_DEBOUNCE_TIME,
            polarity: Polarity::ActiveLow,
            trigger_edge: None,
        }
    }
}

impl EdgeTimedConfig {
    /// The edge the interrupt will be registered for
    pub fn trigger_edge(&self) -> Edge {
        self.trigger_edge.unwrap_or(self.polarity.press_edge())
    }
}
