//! Resource node state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a placed resource node.
///
/// ```text
/// Registered -> Active -> Depleted -> Destroyed
///                  \__________________/
/// ```
///
/// Transitions are monotonic; a node never returns to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeState {
    /// Placed but not yet harvestable.
    #[default]
    Registered,

    /// Harvestable with uses remaining.
    Active,

    /// All uses consumed.
    Depleted,

    /// Removed from the world (terminal state).
    Destroyed,
}

impl NodeState {
    /// Returns true if the node can be activated.
    pub fn can_activate(&self) -> bool {
        matches!(self, NodeState::Registered)
    }

    /// Returns true if the node can be harvested.
    pub fn can_harvest(&self) -> bool {
        matches!(self, NodeState::Active)
    }

    /// Returns true if the node can be destroyed.
    pub fn can_destroy(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Destroyed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Registered => "Registered",
            NodeState::Active => "Active",
            NodeState::Depleted => "Depleted",
            NodeState::Destroyed => "Destroyed",
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        assert_eq!(NodeState::default(), NodeState::Registered);
    }

    #[test]
    fn test_registered_transitions() {
        let state = NodeState::Registered;
        assert!(state.can_activate());
        assert!(!state.can_harvest());
        assert!(state.can_destroy());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_active_transitions() {
        let state = NodeState::Active;
        assert!(!state.can_activate());
        assert!(state.can_harvest());
        assert!(state.can_destroy());
    }

    #[test]
    fn test_depleted_transitions() {
        let state = NodeState::Depleted;
        assert!(!state.can_activate());
        assert!(!state.can_harvest());
        assert!(state.can_destroy());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_destroyed_is_terminal() {
        let state = NodeState::Destroyed;
        assert!(!state.can_activate());
        assert!(!state.can_harvest());
        assert!(!state.can_destroy());
        assert!(state.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeState::Active.to_string(), "Active");
        assert_eq!(NodeState::Destroyed.to_string(), "Destroyed");
    }
}
