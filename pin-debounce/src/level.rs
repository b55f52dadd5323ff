//! Mapping between electrical levels and logical button state.

/// Which raw level means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// High level means pressed
    ActiveHigh,
    /// Low level means pressed, the usual wiring for a switch to ground with a pull-up
    #[default]
    ActiveLow,
}

impl Polarity {
    pub fn from_active_low(active_low: bool) -> Self {
        if active_low {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    /// Map a raw level to the logical pressed state
    pub fn is_pressed(self, level: bool) -> bool {
        match self {
            Polarity::ActiveHigh => level,
            Polarity::ActiveLow => !level,
        }
    }

    /// Raw level of a released input
    pub fn released_level(self) -> bool {
        !self.is_pressed(true)
    }

    /// The edge produced when the input gets pressed
    pub fn press_edge(self) -> Edge {
        match self {
            Polarity::ActiveHigh => Edge::Rising,
            Polarity::ActiveLow => Edge::Falling,
        }
    }
}

/// Interrupt trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// Logical pressed state after `edge` fired on an input with the given `polarity`.
pub fn resolve_state(edge: Edge, polarity: Polarity) -> bool {
    match (edge, polarity) {
        (Edge::Falling, Polarity::ActiveLow) => true,
        (Edge::Falling, Polarity::ActiveHigh) => false,
        (Edge::Rising, Polarity::ActiveLow) => false,
        (Edge::Rising, Polarity::ActiveHigh) => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_state_table() {
        assert!(resolve_state(Edge::Falling, Polarity::ActiveLow));
        assert!(!resolve_state(Edge::Falling, Polarity::ActiveHigh));
        assert!(!resolve_state(Edge::Rising, Polarity::ActiveLow));
        assert!(resolve_state(Edge::Rising, Polarity::ActiveHigh));
    }

    #[test]
    fn test_press_edge_resolves_to_pressed() {
        for polarity in [Polarity::ActiveLow, Polarity::ActiveHigh] {
            assert!(resolve_state(polarity.press_edge(), polarity));
        }
    }

    #[test]
    fn test_polarity_levels() {
        assert!(Polarity::ActiveLow.is_pressed(false));
        assert!(!Polarity::ActiveLow.is_pressed(true));
        assert!(Polarity::ActiveLow.released_level());
        assert!(!Polarity::ActiveHigh.released_level());
        assert_eq!(Polarity::from_active_low(true), Polarity::ActiveLow);
        assert_eq!(Polarity::from_active_low(false), Polarity::ActiveHigh);
        assert_eq!(Polarity::default(), Polarity::ActiveLow);
    }
}
