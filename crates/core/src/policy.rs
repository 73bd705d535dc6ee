use serde::{Deserialize, Serialize};

/// How much a grid lets the user select at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// One cell at a time; range requests are rejected.
    Single,
    /// Rectangular multi-cell selection.
    #[default]
    Range,
    /// Selection disabled entirely.
    None,
}

impl SelectionPolicy {
    /// Whether any cell can become the target.
    pub fn allows_selection(self) -> bool {
        !matches!(self, SelectionPolicy::None)
    }

    /// Whether a multi-cell rectangle is allowed.
    pub fn allows_range(self) -> bool {
        matches!(self, SelectionPolicy::Range)
    }
}

/// Direction of one navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}

impl NavDirection {
    /// (row delta, col delta) for one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            NavDirection::Up => (-1, 0),
            NavDirection::Down => (1, 0),
            NavDirection::Left => (0, -1),
            NavDirection::Right => (0, 1),
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            NavDirection::Up => NavDirection::Down,
            NavDirection::Down => NavDirection::Up,
            NavDirection::Left => NavDirection::Right,
            NavDirection::Right => NavDirection::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_flags() {
        assert!(SelectionPolicy::Single.allows_selection());
        assert!(!SelectionPolicy::Single.allows_range());
        assert!(SelectionPolicy::Range.allows_range());
        assert!(!SelectionPolicy::None.allows_selection());
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(NavDirection::Up.delta(), (-1, 0));
        assert_eq!(NavDirection::Right.delta(), (0, 1));
        assert_eq!(NavDirection::Down.reversed(), NavDirection::Up);
    }
}
