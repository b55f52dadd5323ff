//! Debouncers for noisy digital inputs such as mechanical switches and buttons.
//!
//! Two independent strategies are provided:
//!
//! - [`PollingDebouncer`] samples the pin periodically and commits a new level only after it has
//!   been held continuously for the debounce window. Any bounce restarts the window.
//! - [`EdgeTimedDebouncer`] is fed from an edge interrupt and accepts an edge only when it arrives
//!   more than the debounce window after the previous interrupt (a refractory, or dead-time,
//!   filter).
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod debounce;
pub mod level;
pub mod notification;

pub use config::{ConfigError, EdgeTimedConfig, PollingConfig};
pub use debounce::DebounceState;
pub use debounce::edge_timed::{EdgeSnapshot, EdgeSource, EdgeTimedDebouncer, NoInterrupt};
pub use debounce::polling::{PollingDebouncer, PollingSnapshot};
pub use level::{Edge, Polarity, resolve_state};
pub use notification::Notification;

/// Raw mutex used for every piece of shared state.
///
/// The edge-timed debouncer is updated from interrupt context, so only a critical section is
/// strong enough.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Number of tasks that can wait on a single press or release notification at the same time
pub const NOTIFICATION_WAITERS: usize = 4;
