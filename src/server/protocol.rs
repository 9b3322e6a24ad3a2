use serde::{Deserialize, Serialize};

use crate::config::GameParams;
use crate::session::{
    CareActionKind, CareState, Difficulty, Direction, GameKind, GameSession, Mode, SessionEvent,
    SessionPhase,
};

/// Complete session state sent to a client on connect and after every tick.
/// Sessions hold at most a few dozen entities, so full frames replace
/// per-field diffing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub message_type: &'static str,
    pub session_id: String,
    pub game: String,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub tick: u64,
    pub score: i64,
    pub streak: u32,
    pub best_streak: u32,
    pub time_remaining: Option<u32>,
    pub level: u32,
    pub collector_pos: f64,
    pub collector_width: f64,
    pub actions_remaining: Option<u32>,
    pub bins: Vec<String>,
    /// Entity id of the current prompt in sorting games.
    pub current_item: Option<u32>,
    pub entities: Vec<EntitySnapshot>,
    pub care: Option<CareState>,
}

/// One drawable entity: positions are percentage coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub value: f64,
}

impl SessionSnapshot {
    pub fn from_session(session: &GameSession, params: &GameParams) -> Self {
        let entities = session
            .live_entities()
            .map(|e| EntitySnapshot {
                id: e.id,
                kind: params
                    .kinds
                    .get(e.kind)
                    .map(|k| k.name.clone())
                    .unwrap_or_default(),
                x: e.pos.x,
                y: e.pos.y,
                size: e.size,
                value: e.value,
            })
            .collect();

        SessionSnapshot {
            message_type: "SessionSnapshot",
            session_id: session.id.to_string(),
            game: session.game.slug().to_string(),
            mode: session.mode,
            difficulty: session.difficulty,
            phase: session.phase,
            tick: session.tick_count,
            score: session.score,
            streak: session.streak,
            best_streak: session.best_streak,
            time_remaining: session.time_remaining,
            level: session.level,
            collector_pos: session.collector_pos,
            collector_width: params.collector_width,
            actions_remaining: session.actions_remaining,
            bins: params.bins.clone(),
            current_item: if params.spawn.is_queue() {
                session.current_item().map(|e| e.id)
            } else {
                None
            },
            entities,
            care: session.care.clone(),
        }
    }
}

/// Input messages from the rendering surface, tagged by `input`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum InputMessage {
    Start {
        game: String,
        #[serde(default)]
        mode: Mode,
        #[serde(default)]
        difficulty: Difficulty,
    },
    Activate {
        id: u32,
    },
    Move {
        direction: Direction,
    },
    Sort {
        #[serde(default)]
        id: Option<u32>,
        bin: usize,
    },
    Care {
        action: CareActionKind,
    },
    Pause,
    Resume,
    Reset,
}

impl InputMessage {
    pub fn into_event(self) -> Result<SessionEvent, String> {
        Ok(match self {
            InputMessage::Start {
                game,
                mode,
                difficulty,
            } => SessionEvent::Start {
                game: GameKind::from_slug(&game)
                    .ok_or_else(|| format!("Unknown game '{}'", game))?,
                mode,
                difficulty,
            },
            InputMessage::Activate { id } => SessionEvent::ActivateEntity { id },
            InputMessage::Move { direction } => SessionEvent::MoveCollector { direction },
            InputMessage::Sort { id, bin } => SessionEvent::SortEntity { id, bin },
            InputMessage::Care { action } => SessionEvent::Care { action },
            InputMessage::Pause => SessionEvent::Pause,
            InputMessage::Resume => SessionEvent::Resume,
            InputMessage::Reset => SessionEvent::Reset,
        })
    }
}

/// Health endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub tick: u64,
    pub tick_rate: f32,
    pub game: String,
    pub phase: String,
    pub score: i64,
    pub games_played: u32,
    pub session_id: String,
}
