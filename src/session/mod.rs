pub mod entity;
pub mod event;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use entity::SimEntity;
pub use event::{ActionError, CareActionKind, Direction, SessionEvent};

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    BalloonPop,
    PurifierCatch,
    RiverCleanup,
    WasteSort,
    PlantCare,
    AirMonitor,
}

impl GameKind {
    pub fn all() -> &'static [GameKind] {
        &[
            GameKind::BalloonPop,
            GameKind::PurifierCatch,
            GameKind::RiverCleanup,
            GameKind::WasteSort,
            GameKind::PlantCare,
            GameKind::AirMonitor,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            GameKind::BalloonPop => "balloon-pop",
            GameKind::PurifierCatch => "purifier-catch",
            GameKind::RiverCleanup => "river-cleanup",
            GameKind::WasteSort => "waste-sort",
            GameKind::PlantCare => "plant-care",
            GameKind::AirMonitor => "air-monitor",
        }
    }

    pub fn from_slug(s: &str) -> Option<GameKind> {
        GameKind::all().iter().copied().find(|k| k.slug() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Classic,
    Timed,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Mixed,
}

/// Terminal result of a session.
///
/// `Cleared` marks queue exhaustion (round completion), distinct from a
/// score-threshold win or a loss. `TimeUp` is a time-based completion that
/// met neither a win nor a loss condition first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
    Cleared,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Setup,
    Active,
    Paused,
    Completed(Outcome),
}

impl SessionPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Cold,
}

impl Weather {
    pub fn all() -> &'static [Weather] {
        &[Weather::Sunny, Weather::Cloudy, Weather::Rainy, Weather::Cold]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }
}

// === Care state (plant game) ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareLogEntry {
    pub day: u32,
    pub action: CareActionKind,
    pub amount: f64,
}

/// Number of care actions retained in the history, newest first.
pub const CARE_HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareState {
    pub water: f64,
    pub sunlight: f64,
    pub soil: f64,
    pub health: f64,
    pub stage: u32,
    pub has_weeds: bool,
    pub has_pests: bool,
    pub needs_fertilizer: bool,
    pub day: u32,
    pub weather: Weather,
    pub season: Season,
    pub history: Vec<CareLogEntry>,
}

impl CareState {
    pub fn avg_care(&self) -> f64 {
        (self.water + self.sunlight + self.soil) / 3.0
    }

    pub fn push_history(&mut self, entry: CareLogEntry) {
        self.history.insert(0, entry);
        self.history.truncate(CARE_HISTORY_CAP);
    }
}

// === Session ===

/// One play-through of a single mini-game, from Setup to Completed/reset.
///
/// Created in `Setup` phase with no entities; `engine::start_session`
/// transitions it to `Active` and populates the play field per the game's
/// parameter table.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub id: Uuid,
    pub game: GameKind,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub tick_count: u64,
    pub score: i64,
    /// True once the score has ever been positive; needed to distinguish a
    /// score-to-zero loss from a session that never scored.
    pub score_was_positive: bool,
    pub streak: u32,
    pub best_streak: u32,
    /// Seconds left in a timed session; `None` means untimed.
    pub time_remaining: Option<u32>,
    pub level: u32,
    pub entities: Vec<SimEntity>,
    pub next_entity_id: u32,
    /// Index of the current prompt in sorting games.
    pub queue_cursor: usize,
    /// Left edge of the collector in percentage coordinates (catch games).
    pub collector_pos: f64,
    /// Remaining action budget (air-monitor game); `None` means unbudgeted.
    pub actions_remaining: Option<u32>,
    pub care: Option<CareState>,
    pub items_resolved: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl GameSession {
    pub fn new(game: GameKind, mode: Mode, difficulty: Difficulty) -> Self {
        GameSession {
            id: Uuid::new_v4(),
            game,
            mode,
            difficulty,
            phase: SessionPhase::Setup,
            tick_count: 0,
            score: 0,
            score_was_positive: false,
            streak: 0,
            best_streak: 0,
            time_remaining: None,
            level: 1,
            entities: Vec::new(),
            next_entity_id: 0,
            queue_cursor: 0,
            collector_pos: 0.0,
            actions_remaining: None,
            care: None,
            items_resolved: 0,
            correct_count: 0,
            wrong_count: 0,
        }
    }

    /// The current prompt in a sorting game, if any remain.
    pub fn current_item(&self) -> Option<&SimEntity> {
        self.entities.get(self.queue_cursor).filter(|e| !e.consumed)
    }

    pub fn live_entities(&self) -> impl Iterator<Item = &SimEntity> {
        self.entities.iter().filter(|e| !e.consumed)
    }

    pub fn live_count(&self) -> usize {
        self.live_entities().count()
    }

    pub fn find_live(&self, id: u32) -> Option<usize> {
        self.entities
            .iter()
            .position(|e| e.id == id && !e.consumed)
    }
}
