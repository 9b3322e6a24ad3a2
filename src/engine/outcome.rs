use tracing::info;

use crate::config::GameParams;
use crate::engine::rng::RandomSource;
use crate::engine::{countdown, effective_time_cap, spawner};
use crate::session::{GameSession, Outcome, SessionPhase};

/// Decide whether the session is over and perform the terminal transition.
///
/// A score-threshold win takes priority over every other condition,
/// including time expiry evaluated in the same call. Exhausting the entity
/// set either completes the round (`Cleared`) or, in level-based games,
/// advances to the next level without leaving `Active`. Returns the outcome
/// exactly once; further calls on a completed session are no-ops.
pub fn evaluate(
    session: &mut GameSession,
    params: &GameParams,
    time_expired: bool,
    care_died: bool,
    rng: &mut dyn RandomSource,
) -> Option<Outcome> {
    if !session.phase.is_active() {
        return None;
    }

    let outcome = decide(session, params, time_expired, care_died, rng);
    if let Some(o) = outcome {
        session.phase = SessionPhase::Completed(o);
        info!(
            game = session.game.slug(),
            outcome = ?o,
            score = session.score,
            tick = session.tick_count,
            "session completed"
        );
    }
    outcome
}

fn decide(
    session: &mut GameSession,
    params: &GameParams,
    time_expired: bool,
    care_died: bool,
    rng: &mut dyn RandomSource,
) -> Option<Outcome> {
    if let Some(threshold) = params.win_score {
        if session.score >= threshold {
            return Some(Outcome::Won);
        }
    }

    if params.lose_on_zero && session.score <= 0 && session.score_was_positive {
        return Some(Outcome::Lost);
    }

    if care_died {
        return Some(Outcome::Lost);
    }

    // Air-monitor target: every unsafe gauge at or below the target level
    if params.spawn.is_gauges() && !session.entities.is_empty() {
        let all_clean = session
            .entities
            .iter()
            .filter(|e| !params.kinds[e.kind].safe)
            .all(|e| e.value <= params.target_level);
        if all_clean {
            return Some(Outcome::Won);
        }
    }

    let exhausted = if params.spawn.is_batch() {
        session.items_resolved > 0 && session.live_count() == 0
    } else if params.spawn.is_queue() {
        session.queue_cursor >= session.entities.len()
    } else {
        false
    };

    if exhausted {
        if params.auto_advance_levels {
            advance_level(session, params, rng);
        } else if params.clear_on_exhausted {
            return Some(Outcome::Cleared);
        }
    }

    if time_expired {
        return Some(Outcome::TimeUp);
    }

    None
}

fn advance_level(session: &mut GameSession, params: &GameParams, rng: &mut dyn RandomSource) {
    session.level += 1;
    countdown::grant_bonus(
        session,
        params.level_time_bonus,
        effective_time_cap(session.mode, params),
    );
    spawner::spawn_batch(
        session,
        params,
        params.spawn.batch_size(session.level),
        rng,
    );
    info!(
        level = session.level,
        items = session.live_count(),
        time_remaining = ?session.time_remaining,
        "level cleared, next batch spawned"
    );
}
