use std::collections::HashMap;

use crate::config::GameParams;
use crate::session::{GameSession, SessionPhase};

/// Per-tick aggregate view of a session for introspection and the health
/// endpoint.
#[derive(Debug, Clone)]
pub struct TickStatistics {
    pub tick: u64,
    pub phase: SessionPhase,
    pub score: i64,
    pub streak: u32,
    pub best_streak: u32,
    pub time_remaining: Option<u32>,
    pub level: u32,
    pub live_entities: u32,
    pub kind_counts: HashMap<String, u32>,
    pub health: Option<f64>,
}

pub fn compute_statistics(session: &GameSession, params: &GameParams) -> TickStatistics {
    let mut kind_counts: HashMap<String, u32> = HashMap::new();
    for e in session.live_entities() {
        if let Some(kind) = params.kinds.get(e.kind) {
            *kind_counts.entry(kind.name.clone()).or_insert(0) += 1;
        }
    }

    TickStatistics {
        tick: session.tick_count,
        phase: session.phase,
        score: session.score,
        streak: session.streak,
        best_streak: session.best_streak,
        time_remaining: session.time_remaining,
        level: session.level,
        live_entities: session.live_count() as u32,
        kind_counts,
        health: session.care.as_ref().map(|c| c.health),
    }
}
