use serde::{Deserialize, Serialize};

use crate::session::{Difficulty, GameKind, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareActionKind {
    Water,
    Sunlight,
    Fertilize,
    RemoveWeeds,
    PestControl,
}

/// One input to the session: every timer tick and every player action is an
/// event applied through a single transition path in `engine`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Start {
        game: GameKind,
        mode: Mode,
        difficulty: Difficulty,
    },
    /// Click/tap on an entity. Stale or unknown ids are silent no-ops.
    ActivateEntity { id: u32 },
    MoveCollector { direction: Direction },
    /// Sort an entity into a bin; `id: None` targets the current queue item.
    SortEntity { id: Option<u32>, bin: usize },
    Care { action: CareActionKind },
    Pause,
    Resume,
    Reset,
}

/// A player action that was rejected (state unchanged). Distinct from
/// ignored inputs, which produce no error at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    InsufficientPoints { needed: i64, available: i64 },
    NoActionsRemaining,
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::InsufficientPoints { needed, available } => write!(
                f,
                "Action costs {} points but only {} are available",
                needed, available
            ),
            ActionError::NoActionsRemaining => write!(f, "No actions remaining"),
        }
    }
}

impl std::error::Error for ActionError {}
