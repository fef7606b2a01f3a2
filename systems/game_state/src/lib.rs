#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Finite state machine tracking the top-level mode of the game.
//!
//! The machine is constructed explicitly and shared by reference. Every
//! committed transition notifies, in order, the `Exited` subscribers of the
//! old state, the `Entered` subscribers of the new state and finally the
//! global [`StateChanged`] channel. The new state is committed before any
//! callback runs.

use std::sync::{Mutex, MutexGuard, PoisonError};

use harpoon_core::{GameState, StateChanged, StateError, StateEventKind};
use harpoon_event_bus::{
    BusError, Channel, EventRegistry, PublishError, StateSubscriptionSet, Subscription,
};
use tracing::{debug, info, warn};

/// Scope of the global state-changed channel.
pub const STATE_SCOPE: &str = "game_state";

/// Event name of the global state-changed channel.
pub const STATE_CHANGED_EVENT: &str = "state_changed";

/// Outcome of a committed state change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Transition {
    previous: GameState,
    current: GameState,
    failures: Vec<PublishError>,
}

impl Transition {
    /// State that was current before the change.
    #[must_use]
    pub const fn previous(&self) -> GameState {
        self.previous
    }

    /// State that is current after the change.
    #[must_use]
    pub const fn current(&self) -> GameState {
        self.current
    }

    /// Notifications in which at least one subscriber panicked.
    #[must_use]
    pub fn failures(&self) -> &[PublishError] {
        &self.failures
    }

    /// Reports whether the transition re-entered the state it left.
    #[must_use]
    pub fn is_reentry(&self) -> bool {
        self.previous == self.current
    }
}

/// Single current [`GameState`] with its legal transition table.
#[derive(Debug)]
pub struct GameStateMachine {
    current: Mutex<GameState>,
    states: [StateSubscriptionSet; GameState::COUNT],
    state_changed: Channel<StateChanged>,
}

impl GameStateMachine {
    /// Creates a machine on the title screen, resolving the global
    /// state-changed channel from `registry`.
    pub fn new(registry: &EventRegistry) -> Result<Self, BusError> {
        let state_changed = registry.channel(STATE_SCOPE, STATE_CHANGED_EVENT)?;
        Ok(Self {
            current: Mutex::new(GameState::default()),
            states: GameState::ALL.map(|state| StateSubscriptionSet::new(state.to_string())),
            state_changed,
        })
    }

    /// Currently active state.
    #[must_use]
    pub fn current(&self) -> GameState {
        *self.lock()
    }

    /// Global channel broadcasting every committed transition.
    #[must_use]
    pub fn state_changed(&self) -> &Channel<StateChanged> {
        &self.state_changed
    }

    /// Registers `callback` for `kind` notifications of `state`.
    pub fn subscribe<F>(
        &self,
        state: GameState,
        kind: StateEventKind,
        owner: &str,
        callback: F,
    ) -> Subscription
    where
        F: Fn(StateEventKind) + Send + Sync + 'static,
    {
        self.states[state.index()].subscribe(kind, owner, callback)
    }

    /// Title screen to level.
    pub fn activate_level(&self) -> bool {
        self.trigger(GameState::TitleScreen, GameState::Level)
    }

    /// Level to paused.
    pub fn pause_game(&self) -> bool {
        self.trigger(GameState::Level, GameState::Paused)
    }

    /// Paused back to level.
    pub fn unpause_game(&self) -> bool {
        self.trigger(GameState::Paused, GameState::Level)
    }

    /// Paused to title screen.
    pub fn activate_title_screen(&self) -> bool {
        self.trigger(GameState::Paused, GameState::TitleScreen)
    }

    /// Level to upgrade menu, taken when a wave has been cleared.
    pub fn open_upgrade_menu(&self) -> bool {
        self.trigger(GameState::Level, GameState::UpgradeMenu)
    }

    /// Upgrade menu back to level.
    pub fn finish_upgrades(&self) -> bool {
        self.trigger(GameState::UpgradeMenu, GameState::Level)
    }

    /// Moves to `to` if the transition table allows it from the current state.
    ///
    /// The check and the commit happen under one lock, so concurrent callers
    /// cannot both leave the same state.
    pub fn try_transition(&self, to: GameState) -> Result<Transition, StateError> {
        self.transition(None, to)
    }

    /// Moves from `from` to `to`, failing unless `from` is the current state
    /// and the edge is in the transition table.
    pub fn try_transition_from(
        &self,
        from: GameState,
        to: GameState,
    ) -> Result<Transition, StateError> {
        self.transition(Some(from), to)
    }

    /// Commits `state` without consulting the transition table.
    ///
    /// Setting the current state again re-runs the notifications.
    pub fn set_state(&self, state: GameState) -> Transition {
        let previous = std::mem::replace(&mut *self.lock(), state);
        self.announce(previous, state)
    }

    /// Commits the state with raw index `raw`.
    pub fn set_state_index(&self, raw: u8) -> Result<Transition, StateError> {
        let state = GameState::try_from(raw)?;
        Ok(self.set_state(state))
    }

    /// Notifies the `Modified` subscribers of the current state.
    pub fn notify_modified(&self) -> Result<usize, PublishError> {
        let current = self.current();
        self.states[current.index()].notify(StateEventKind::Modified)
    }

    fn transition(
        &self,
        expected: Option<GameState>,
        to: GameState,
    ) -> Result<Transition, StateError> {
        let previous = {
            let mut current = self.lock();
            let from = *current;
            let source_matches = expected.map_or(true, |expected| expected == from);
            if !source_matches || !from.can_transition_to(to) {
                return Err(StateError::InvalidTransition { from, to });
            }
            *current = to;
            from
        };
        Ok(self.announce(previous, to))
    }

    fn trigger(&self, from: GameState, to: GameState) -> bool {
        match self.try_transition_from(from, to) {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "ignored state change");
                false
            }
        }
    }

    fn announce(&self, previous: GameState, current: GameState) -> Transition {
        if previous == current {
            debug!(state = %current, "re-entering current state");
        } else {
            info!(from = %previous, to = %current, "game state changed");
        }

        let mut failures = Vec::new();
        if let Err(error) = self.states[previous.index()].notify(StateEventKind::Exited) {
            failures.push(error);
        }
        if let Err(error) = self.states[current.index()].notify(StateEventKind::Entered) {
            failures.push(error);
        }
        if let Err(error) = self
            .state_changed
            .publish(&StateChanged { previous, current })
        {
            failures.push(error);
        }

        Transition {
            previous,
            current,
            failures,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> GameStateMachine {
        GameStateMachine::new(&EventRegistry::new()).expect("fresh registry")
    }

    #[test]
    fn starts_on_title_screen() {
        assert_eq!(machine().current(), GameState::TitleScreen);
    }

    #[test]
    fn illegal_trigger_is_a_no_op() {
        let machine = machine();
        assert!(!machine.pause_game());
        assert!(!machine.finish_upgrades());
        assert_eq!(machine.current(), GameState::TitleScreen);
    }

    #[test]
    fn try_transition_reports_rejected_edge() {
        let machine = machine();
        assert_eq!(
            machine.try_transition(GameState::Paused),
            Err(StateError::InvalidTransition {
                from: GameState::TitleScreen,
                to: GameState::Paused,
            })
        );
    }

    #[test]
    fn set_state_allows_reentry() {
        let machine = machine();
        let transition = machine.set_state(GameState::TitleScreen);
        assert!(transition.is_reentry());
        assert!(transition.failures().is_empty());
    }

    #[test]
    fn raw_index_out_of_range_is_rejected() {
        let machine = machine();
        assert_eq!(
            machine.set_state_index(4),
            Err(StateError::OutOfRange(4))
        );
        assert_eq!(machine.current(), GameState::TitleScreen);

        let transition = machine.set_state_index(3).expect("upgrade menu index");
        assert_eq!(transition.current(), GameState::UpgradeMenu);
    }
}
