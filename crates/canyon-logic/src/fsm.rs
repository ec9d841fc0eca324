//! Per-soldier finite state machine.
//!
//! The machine only tracks which state is active and for how long. Side
//! effects of entering and leaving a state (stopping, claiming or freeing a
//! cover) are delegated to a [`StateHooks`] implementation so the same
//! transition rules drive both the ECS engine and plain unit tests.

use serde::{Deserialize, Serialize};

/// Enter hooks may redirect at most this many times in one transition.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoldierState {
    #[default]
    Idle,
    SquadMovement,
    GoToAssignedCover,
    InCover,
    IndividualMovement,
    Regrouping,
}

impl SoldierState {
    pub fn name(&self) -> &'static str {
        match self {
            SoldierState::Idle => "Idle",
            SoldierState::SquadMovement => "SquadMovement",
            SoldierState::GoToAssignedCover => "GoToAssignedCover",
            SoldierState::InCover => "InCover",
            SoldierState::IndividualMovement => "IndividualMovement",
            SoldierState::Regrouping => "Regrouping",
        }
    }

    /// States that hold a claimed cover.
    pub fn holds_cover(&self) -> bool {
        matches!(self, SoldierState::GoToAssignedCover | SoldierState::InCover)
    }

    /// States that need an assigned cover to make sense.
    pub fn needs_cover(&self) -> bool {
        matches!(
            self,
            SoldierState::GoToAssignedCover | SoldierState::InCover | SoldierState::IndividualMovement
        )
    }
}

impl std::fmt::Display for SoldierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Side effects run by [`StateMachine::transition_to`].
pub trait StateHooks {
    /// Called on the state being left, before the new one is entered.
    fn on_exit(&mut self, from: SoldierState, to: SoldierState);

    /// Called after `state` became current. Returning `Some(other)` redirects
    /// into `other` as a second, complete transition.
    fn on_enter(&mut self, state: SoldierState) -> Option<SoldierState>;
}

/// Hooks that do nothing. Useful where no agent is attached yet.
pub struct NoHooks;

impl StateHooks for NoHooks {
    fn on_exit(&mut self, _from: SoldierState, _to: SoldierState) {}

    fn on_enter(&mut self, _state: SoldierState) -> Option<SoldierState> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    current: SoldierState,
    previous: Option<SoldierState>,
    time_in_state: f32,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// A machine resting in `Idle`.
    pub fn new() -> Self {
        Self {
            current: SoldierState::Idle,
            previous: None,
            time_in_state: 0.0,
        }
    }

    pub fn current(&self) -> SoldierState {
        self.current
    }

    pub fn previous(&self) -> Option<SoldierState> {
        self.previous
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn is_in(&self, state: SoldierState) -> bool {
        self.current == state
    }

    pub fn tick(&mut self, dt: f32) {
        self.time_in_state += dt;
    }

    /// Switch to `target`. No-op when already there.
    ///
    /// Returns whether the current state changed.
    pub fn transition_to<H: StateHooks>(&mut self, target: SoldierState, hooks: &mut H) -> bool {
        let start = self.current;
        let mut target = target;

        for _ in 0..=MAX_REDIRECTS {
            if target == self.current {
                break;
            }
            let from = self.current;
            hooks.on_exit(from, target);
            self.previous = Some(from);
            self.current = target;
            self.time_in_state = 0.0;
            tracing::trace!("state {} -> {}", from, target);

            match hooks.on_enter(target) {
                Some(redirect) => target = redirect,
                None => break,
            }
        }

        self.current != start
    }

    /// Go back to the state before the last transition, if any.
    pub fn revert_to_previous<H: StateHooks>(&mut self, hooks: &mut H) -> bool {
        match self.previous {
            Some(prev) => self.transition_to(prev, hooks),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        has_cover: bool,
    }

    impl StateHooks for Recorder {
        fn on_exit(&mut self, from: SoldierState, to: SoldierState) {
            self.log.push(format!("exit {} -> {}", from, to));
        }

        fn on_enter(&mut self, state: SoldierState) -> Option<SoldierState> {
            self.log.push(format!("enter {}", state));
            if state.needs_cover() && !self.has_cover {
                return Some(SoldierState::Idle);
            }
            None
        }
    }

    #[test]
    fn test_starts_idle() {
        let fsm = StateMachine::new();
        assert_eq!(fsm.current(), SoldierState::Idle);
        assert_eq!(fsm.previous(), None);
    }

    #[test]
    fn test_transition_runs_hooks_in_order() {
        let mut fsm = StateMachine::new();
        let mut hooks = Recorder {
            has_cover: true,
            ..Default::default()
        };
        fsm.tick(2.0);
        assert!(fsm.transition_to(SoldierState::GoToAssignedCover, &mut hooks));
        assert_eq!(fsm.time_in_state(), 0.0);
        assert_eq!(fsm.previous(), Some(SoldierState::Idle));
        assert_eq!(
            hooks.log,
            vec!["exit Idle -> GoToAssignedCover", "enter GoToAssignedCover"]
        );
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut fsm = StateMachine::new();
        let mut hooks = Recorder::default();
        fsm.transition_to(SoldierState::SquadMovement, &mut hooks);
        fsm.tick(1.5);
        hooks.log.clear();

        assert!(!fsm.transition_to(SoldierState::SquadMovement, &mut hooks));
        assert!(hooks.log.is_empty());
        assert_eq!(fsm.time_in_state(), 1.5);
    }

    #[test]
    fn test_enter_hook_redirects() {
        let mut fsm = StateMachine::new();
        let mut hooks = Recorder::default();
        fsm.transition_to(SoldierState::SquadMovement, &mut hooks);
        hooks.log.clear();

        // no cover assigned: bounced to Idle
        assert!(fsm.transition_to(SoldierState::GoToAssignedCover, &mut hooks));
        assert_eq!(fsm.current(), SoldierState::Idle);
        assert_eq!(fsm.previous(), Some(SoldierState::GoToAssignedCover));
        assert_eq!(
            hooks.log,
            vec![
                "exit SquadMovement -> GoToAssignedCover",
                "enter GoToAssignedCover",
                "exit GoToAssignedCover -> Idle",
                "enter Idle",
            ]
        );
    }

    #[test]
    fn test_redirect_back_to_start_reports_unchanged() {
        let mut fsm = StateMachine::new();
        let mut hooks = Recorder::default();
        assert!(!fsm.transition_to(SoldierState::InCover, &mut hooks));
        assert_eq!(fsm.current(), SoldierState::Idle);
    }

    #[test]
    fn test_revert_to_previous() {
        let mut fsm = StateMachine::new();
        let mut hooks = NoHooks;
        assert!(!fsm.revert_to_previous(&mut hooks));

        fsm.transition_to(SoldierState::Regrouping, &mut hooks);
        fsm.transition_to(SoldierState::SquadMovement, &mut hooks);
        assert!(fsm.revert_to_previous(&mut hooks));
        assert_eq!(fsm.current(), SoldierState::Regrouping);
    }
}
