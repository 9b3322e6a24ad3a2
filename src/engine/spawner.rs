use crate::config::{GameParams, KindParams};
use crate::engine::rng::RandomSource;
use crate::session::{GameSession, SimEntity};

/// Weighted kind selection: the first kind whose cumulative weight meets or
/// exceeds the draw wins. Weights need not sum to 1; the last kind is the
/// fallback when rounding leaves the draw unmatched.
///
/// Pure and deterministic given its inputs.
pub fn pick_kind(kinds: &[KindParams], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, kind) in kinds.iter().enumerate() {
        cumulative += kind.weight;
        if draw <= cumulative {
            return i;
        }
    }
    kinds.len() - 1
}

/// Weighted selection over a filtered index set, same fallback rule.
fn pick_kind_among(kinds: &[KindParams], eligible: &[usize], draw: f64) -> usize {
    let total: f64 = eligible.iter().map(|&i| kinds[i].weight).sum();
    let scaled = draw * total;
    let mut cumulative = 0.0;
    for &i in eligible {
        cumulative += kinds[i].weight;
        if scaled <= cumulative {
            return i;
        }
    }
    eligible.last().copied().unwrap_or(0)
}

fn next_id(session: &mut GameSession) -> u32 {
    let id = session.next_entity_id;
    session.next_entity_id += 1;
    id
}

/// Spawn one entity with a weighted-random kind and randomized placement,
/// size, and speed within the configured bounds.
pub fn spawn_entity(
    session: &mut GameSession,
    params: &GameParams,
    rng: &mut dyn RandomSource,
) -> u32 {
    let kind_idx = pick_kind(&params.kinds, rng.next_unit());
    let kind = &params.kinds[kind_idx];
    let spawn = &params.spawn;

    let x = rng.next_range(spawn.x_range.0, spawn.x_range.1);
    let y = rng.next_range(spawn.y_range.0, spawn.y_range.1);
    let size = rng.next_range(kind.size_range.0, kind.size_range.1);
    let speed = rng.next_range(kind.speed_range.0, kind.speed_range.1);

    let id = next_id(session);
    let mut entity = SimEntity::new(id, kind_idx, x, y);
    entity.size = size;
    entity.speed = speed;
    session.entities.push(entity);
    id
}

/// Spawn an initial or per-level batch.
pub fn spawn_batch(
    session: &mut GameSession,
    params: &GameParams,
    count: u32,
    rng: &mut dyn RandomSource,
) {
    for _ in 0..count {
        spawn_entity(session, params, rng);
    }
}

/// Build a sequential prompt queue for sorting games, honoring the
/// session's difficulty filter.
pub fn build_queue(
    session: &mut GameSession,
    params: &GameParams,
    count: u32,
    rng: &mut dyn RandomSource,
) {
    let eligible: Vec<usize> = (0..params.kinds.len())
        .filter(|&i| params.kinds[i].matches_difficulty(session.difficulty))
        .collect();
    // An over-narrow filter falls back to the whole table
    let eligible = if eligible.is_empty() {
        (0..params.kinds.len()).collect()
    } else {
        eligible
    };

    for _ in 0..count {
        let kind_idx = pick_kind_among(&params.kinds, &eligible, rng.next_unit());
        let id = next_id(session);
        // Queue prompts are presented centered; position is not gameplay-relevant
        session.entities.push(SimEntity::new(id, kind_idx, 50.0, 50.0));
    }
    session.queue_cursor = 0;
}

/// Spawn one gauge per kind with its level drawn from the configured range
/// (air-monitor game).
pub fn spawn_gauges(
    session: &mut GameSession,
    params: &GameParams,
    rng: &mut dyn RandomSource,
) {
    let count = params.kinds.len();
    for kind_idx in 0..count {
        let kind = &params.kinds[kind_idx];
        let value = rng.next_range(kind.value_range.0, kind.value_range.1);
        let id = next_id(session);
        // Gauges sit in a fixed row across the field
        let x = (kind_idx as f64 + 0.5) * (100.0 / count as f64);
        let mut entity = SimEntity::new(id, kind_idx, x, 50.0);
        entity.value = value;
        session.entities.push(entity);
    }
}
