pub mod edge_timed;
pub mod polling;

/// Outcome of one debounce evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    /// A new stable level was committed
    Debounced,
    /// A candidate level differs from the stable one and is still being timed
    InProgress,
    /// The input matches the stable level, nothing to do
    Ignored,
}
