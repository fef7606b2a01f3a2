use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level mode of the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Title screen shown at boot and after quitting a level.
    #[default]
    TitleScreen,
    /// A level is being played.
    Level,
    /// The level is paused.
    Paused,
    /// The level is suspended while the player picks upgrades.
    UpgradeMenu,
}

impl GameState {
    /// Number of live states.
    pub const COUNT: usize = 4;

    /// Every state in declaration order.
    pub const ALL: [GameState; Self::COUNT] = [
        GameState::TitleScreen,
        GameState::Level,
        GameState::Paused,
        GameState::UpgradeMenu,
    ];

    /// Dense index of the state, suitable for array lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::TitleScreen => 0,
            Self::Level => 1,
            Self::Paused => 2,
            Self::UpgradeMenu => 3,
        }
    }

    /// Reports whether moving from `self` to `to` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, to: GameState) -> bool {
        matches!(
            (self, to),
            (Self::TitleScreen, Self::Level)
                | (Self::Level, Self::Paused)
                | (Self::Paused, Self::Level)
                | (Self::Paused, Self::TitleScreen)
                | (Self::Level, Self::UpgradeMenu)
                | (Self::UpgradeMenu, Self::Level)
        )
    }
}

impl TryFrom<u8> for GameState {
    type Error = StateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(StateError::OutOfRange(value))
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TitleScreen => "title screen",
            Self::Level => "level",
            Self::Paused => "paused",
            Self::UpgradeMenu => "upgrade menu",
        };
        f.write_str(name)
    }
}

/// Kind of notification delivered to state subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateEventKind {
    /// The state became current.
    Entered,
    /// The state stopped being current.
    Exited,
    /// The state stayed current but its data changed.
    Modified,
}

impl StateEventKind {
    /// Number of notification kinds.
    pub const COUNT: usize = 3;

    /// Every kind in declaration order.
    pub const ALL: [StateEventKind; Self::COUNT] = [
        StateEventKind::Entered,
        StateEventKind::Exited,
        StateEventKind::Modified,
    ];

    /// Dense index of the kind, suitable for array lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Entered => 0,
            Self::Exited => 1,
            Self::Modified => 2,
        }
    }
}

/// Payload of the global state-changed broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChanged {
    /// State that was current before the transition.
    pub previous: GameState,
    /// State that is current after the transition.
    pub current: GameState,
}

/// Reasons a state change request may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    /// A raw state index does not name a live state.
    #[error("state index {0} does not name a game state")]
    OutOfRange(u8),
    /// The transition table has no edge between the two states.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        /// State the machine was in.
        from: GameState,
        /// State that was requested.
        to: GameState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_indices_round_trip_and_reject_sentinel() {
        for state in GameState::ALL {
            let raw = u8::try_from(state.index()).expect("small index");
            assert_eq!(GameState::try_from(raw), Ok(state));
        }
        assert_eq!(
            GameState::try_from(4),
            Err(StateError::OutOfRange(4)),
            "COUNT is a sentinel, never a live state"
        );
    }

    #[test]
    fn transition_table_matches_menu_flow() {
        use GameState::*;

        let legal = [
            (TitleScreen, Level),
            (Level, Paused),
            (Paused, Level),
            (Paused, TitleScreen),
            (Level, UpgradeMenu),
            (UpgradeMenu, Level),
        ];
        for from in GameState::ALL {
            for to in GameState::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }
}
