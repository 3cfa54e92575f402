//! The locomotion state machine: a closed variant set with exactly one
//! active state, switched through exit-then-enter hooks. `Dead` is terminal
//! until an explicit respawn.
#![forbid(unsafe_code)]

use std::fmt;

use locomotion_core::logging;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocomotionState {
    Default,
    Jumping,
    Crouching,
    /// Carries the 2-D input axis captured when the dash fired.
    Dashing { axis: [Real; 2] },
    Climbing,
    Dead,
}

impl LocomotionState {
    pub fn is_dead(&self) -> bool {
        matches!(self, LocomotionState::Dead)
    }

    /// Variant equality ignoring payload, for transition guards.
    pub fn same_variant(&self, other: &LocomotionState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum StateError {
    /// `Dead` only leaves through `respawn`.
    Terminal,
    /// At most one switch per tick; the first matching guard won.
    AlreadySwitched,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Terminal => write!(f, "dead state is terminal until respawn"),
            StateError::AlreadySwitched => write!(f, "state already switched this tick"),
        }
    }
}

impl std::error::Error for StateError {}

/// Exit/enter callbacks invoked around every switch. Exit always runs
/// before the next state's enter.
pub trait StateHooks {
    fn on_exit(&mut self, state: &LocomotionState);
    fn on_enter(&mut self, state: &LocomotionState);
}

pub struct StateMachine {
    current: LocomotionState,
    switched_this_tick: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: LocomotionState::Default,
            switched_this_tick: false,
        }
    }

    pub fn current(&self) -> LocomotionState {
        self.current
    }

    /// Reopens the one-switch-per-tick window. Call once at the top of each
    /// simulation tick.
    pub fn begin_tick(&mut self) {
        self.switched_this_tick = false;
    }

    pub fn try_switch(
        &mut self,
        next: LocomotionState,
        hooks: &mut impl StateHooks,
    ) -> Result<(), StateError> {
        if self.current.is_dead() {
            return Err(StateError::Terminal);
        }
        if self.switched_this_tick {
            return Err(StateError::AlreadySwitched);
        }
        let previous = self.current;
        hooks.on_exit(&previous);
        hooks.on_enter(&next);
        self.current = next;
        self.switched_this_tick = true;
        logging::debug(format!("state {:?} -> {:?}", previous, next));
        Ok(())
    }

    /// Leaves `Dead` for a fresh `Default`. The only transition out of the
    /// terminal state.
    pub fn respawn(&mut self, hooks: &mut impl StateHooks) {
        hooks.on_exit(&self.current);
        hooks.on_enter(&LocomotionState::Default);
        self.current = LocomotionState::Default;
        self.switched_this_tick = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHooks {
        log: Vec<String>,
    }

    impl StateHooks for RecordingHooks {
        fn on_exit(&mut self, state: &LocomotionState) {
            self.log.push(format!("exit {:?}", state));
        }

        fn on_enter(&mut self, state: &LocomotionState) {
            self.log.push(format!("enter {:?}", state));
        }
    }

    #[test]
    fn exit_runs_before_enter() {
        let mut machine = StateMachine::new();
        let mut hooks = RecordingHooks::default();
        machine
            .try_switch(LocomotionState::Jumping, &mut hooks)
            .unwrap();
        assert_eq!(hooks.log, vec!["exit Default", "enter Jumping"]);
        assert_eq!(machine.current(), LocomotionState::Jumping);
    }

    #[test]
    fn one_switch_per_tick() {
        let mut machine = StateMachine::new();
        let mut hooks = RecordingHooks::default();
        machine
            .try_switch(LocomotionState::Crouching, &mut hooks)
            .unwrap();
        assert_eq!(
            machine.try_switch(LocomotionState::Jumping, &mut hooks),
            Err(StateError::AlreadySwitched)
        );
        machine.begin_tick();
        assert!(machine.try_switch(LocomotionState::Jumping, &mut hooks).is_ok());
    }

    #[test]
    fn dead_is_terminal_until_respawn() {
        let mut machine = StateMachine::new();
        let mut hooks = RecordingHooks::default();
        machine.try_switch(LocomotionState::Dead, &mut hooks).unwrap();
        machine.begin_tick();
        assert_eq!(
            machine.try_switch(LocomotionState::Default, &mut hooks),
            Err(StateError::Terminal)
        );
        machine.respawn(&mut hooks);
        assert_eq!(machine.current(), LocomotionState::Default);
    }

    #[test]
    fn dashing_payload_compares_by_variant() {
        let a = LocomotionState::Dashing { axis: [0.0, 1.0] };
        let b = LocomotionState::Dashing { axis: [1.0, 0.0] };
        assert!(a.same_variant(&b));
        assert_ne!(a, b);
        assert!(!a.same_variant(&LocomotionState::Default));
    }
}
