//! Lifecycle state machines
//!
//! Managers and graphics contexts move through small fixed lifecycles.
//! Transitions are computed here; owners keep the state and refuse any
//! operation whose event has no transition from where they are.

use std::fmt;

/// Lifecycle of a process-scoped manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerState {
    /// Constructed, nothing registered with the OS yet
    #[default]
    Uninitialised,
    /// OS registrations done and extensions bootstrapped
    Initialised,
    /// Torn down; terminal
    Destroyed,
}

/// Events driving [`ManagerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initialise,
    Shutdown,
}

/// Lifecycle of a rendering context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// Native context exists but was never bound
    #[default]
    Created,
    /// Bound to the owning thread
    Current,
    /// Unbound after having been current
    NonCurrent,
    /// Native context deleted; terminal
    Destroyed,
}

/// Events driving [`ContextState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEvent {
    MakeCurrent,
    MakeNonCurrent,
    Destroy,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManagerState::Uninitialised => "uninitialised",
            ManagerState::Initialised => "initialised",
            ManagerState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Created => "created",
            ContextState::Current => "current",
            ContextState::NonCurrent => "non-current",
            ContextState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Transition tables for both lifecycles
pub struct StateMachine;

impl StateMachine {
    /// Next manager state, `None` when `event` is not valid from `current`
    pub fn process_lifecycle_event(
        current: ManagerState,
        event: LifecycleEvent,
    ) -> Option<ManagerState> {
        match (current, event) {
            (ManagerState::Uninitialised, LifecycleEvent::Initialise) => {
                Some(ManagerState::Initialised)
            }
            // A manager that never initialised has nothing to release
            (ManagerState::Uninitialised, LifecycleEvent::Shutdown)
            | (ManagerState::Initialised, LifecycleEvent::Shutdown) => Some(ManagerState::Destroyed),
            _ => None,
        }
    }

    /// Next context state, `None` when `event` is not valid from `current`
    ///
    /// Rebinding a current context and unbinding a non-current one are
    /// allowed; the OS treats both as no-ops.
    pub fn process_context_event(
        current: ContextState,
        event: ContextEvent,
    ) -> Option<ContextState> {
        match (current, event) {
            (ContextState::Destroyed, _) => None,
            (_, ContextEvent::Destroy) => Some(ContextState::Destroyed),
            (_, ContextEvent::MakeCurrent) => Some(ContextState::Current),
            (_, ContextEvent::MakeNonCurrent) => Some(ContextState::NonCurrent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_lifecycle_runs_forward_only() {
        let state = ManagerState::default();
        let state = StateMachine::process_lifecycle_event(state, LifecycleEvent::Initialise);
        assert_eq!(state, Some(ManagerState::Initialised));

        let initialised = ManagerState::Initialised;
        assert_eq!(
            StateMachine::process_lifecycle_event(initialised, LifecycleEvent::Initialise),
            None
        );
        assert_eq!(
            StateMachine::process_lifecycle_event(initialised, LifecycleEvent::Shutdown),
            Some(ManagerState::Destroyed)
        );
    }

    #[test]
    fn destroyed_manager_accepts_nothing() {
        for event in [LifecycleEvent::Initialise, LifecycleEvent::Shutdown] {
            assert_eq!(
                StateMachine::process_lifecycle_event(ManagerState::Destroyed, event),
                None
            );
        }
    }

    #[test]
    fn context_toggles_between_current_and_non_current() {
        let mut state = ContextState::Created;
        for (event, expected) in [
            (ContextEvent::MakeCurrent, ContextState::Current),
            (ContextEvent::MakeNonCurrent, ContextState::NonCurrent),
            (ContextEvent::MakeCurrent, ContextState::Current),
            (ContextEvent::Destroy, ContextState::Destroyed),
        ] {
            state = StateMachine::process_context_event(state, event).unwrap();
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn destroyed_context_is_terminal() {
        assert_eq!(
            StateMachine::process_context_event(ContextState::Destroyed, ContextEvent::MakeCurrent),
            None
        );
        assert_eq!(
            StateMachine::process_context_event(ContextState::Destroyed, ContextEvent::Destroy),
            None
        );
    }

    #[test]
    fn states_display_in_lower_case() {
        assert_eq!(ManagerState::Uninitialised.to_string(), "uninitialised");
        assert_eq!(ContextState::NonCurrent.to_string(), "non-current");
    }
}
