use tracing::debug;

use crate::config::CareParams;
use crate::engine::rng::RandomSource;
use crate::session::{
    ActionError, CareActionKind, CareLogEntry, CareState, GameSession, Season, Weather,
};

/// What one care tick did to the plant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CareTickReport {
    pub health_delta: f64,
    pub grew: bool,
    /// Health reached zero on this tick.
    pub died: bool,
}

pub fn initial_care_state(params: &CareParams) -> CareState {
    CareState {
        water: params.initial_water,
        sunlight: params.initial_sunlight,
        soil: params.initial_soil,
        health: params.initial_health,
        stage: 0,
        has_weeds: false,
        has_pests: false,
        needs_fertilizer: false,
        day: 1,
        weather: Weather::Sunny,
        season: Season::Spring,
        history: Vec::new(),
    }
}

/// One step of the decay model: reduce care levels, roll hazards, derive the
/// health delta, advance growth, then advance the simulated calendar.
pub fn care_tick(
    care: &mut CareState,
    params: &CareParams,
    rng: &mut dyn RandomSource,
) -> CareTickReport {
    let health_before = care.health;

    // Decay, with weather modifiers on consumption
    let water_decay = params.water_decay
        + if care.weather == Weather::Sunny {
            params.sunny_water_extra
        } else {
            0.0
        };
    let sunlight_decay = params.sunlight_decay
        + if care.weather == Weather::Cloudy {
            params.cloudy_sunlight_extra
        } else {
            0.0
        };
    care.water = (care.water - water_decay).max(0.0);
    care.sunlight = (care.sunlight - sunlight_decay).max(0.0);
    care.soil = (care.soil - params.soil_decay).max(0.0);

    // Hazard introduction: each flag re-rolls independently
    if rng.next_unit() < params.weeds_prob {
        care.has_weeds = true;
    }
    if rng.next_unit() < params.pests_prob {
        care.has_pests = true;
    }
    if rng.next_unit() < params.fertilizer_prob {
        care.needs_fertilizer = true;
    }

    // Health delta from average care
    let avg = care.avg_care();
    let mut delta = if avg > params.high_care_threshold {
        params.healthy_delta
    } else if avg > params.low_care_threshold {
        0.0
    } else {
        params.neglect_delta
    };

    if care.has_weeds {
        delta -= params.weeds_penalty;
    }
    if care.has_pests {
        delta -= params.pests_penalty;
    }
    if care.needs_fertilizer && care.soil < params.low_soil_threshold {
        delta -= params.fertilizer_penalty;
    }

    match care.weather {
        Weather::Rainy if care.water < params.rain_water_threshold => {
            delta += params.rain_bonus;
        }
        Weather::Cold => delta -= params.cold_penalty,
        _ => {}
    }

    care.health = (care.health + delta).clamp(0.0, 100.0);

    // Growth: probabilistic stage advance under sustained good care
    let mut grew = false;
    if care.health > params.growth_health_threshold
        && avg > params.growth_care_threshold
        && care.stage < params.max_stage
        && rng.next_unit() < params.growth_prob
    {
        care.stage += 1;
        grew = true;
        debug!(stage = care.stage, "plant advanced a growth stage");
    }

    // Calendar advance
    care.day += 1;
    if care.day % params.weather_change_days == 0 {
        care.weather = Weather::all()[rng.next_index(Weather::all().len())];
    }
    if care.day % params.season_change_days == 0 {
        care.season = care.season.next();
    }

    CareTickReport {
        health_delta: delta,
        grew,
        died: health_before > 0.0 && care.health <= 0.0,
    }
}

/// Apply an explicit player care action. Costs are charged against the
/// session score; an unaffordable action is rejected with the state
/// unchanged. Actions without a matching hazard are silent no-ops.
pub fn perform_care(
    session: &mut GameSession,
    params: &CareParams,
    action: CareActionKind,
) -> Result<(), ActionError> {
    let Some(care) = session.care.as_mut() else {
        return Ok(());
    };

    let cost = match action {
        CareActionKind::Water | CareActionKind::Sunlight => 0,
        CareActionKind::Fertilize => params.fertilize_cost,
        CareActionKind::RemoveWeeds => params.weed_cost,
        CareActionKind::PestControl => params.pest_cost,
    };

    // Hazard-directed actions with nothing to treat are ignored
    match action {
        CareActionKind::RemoveWeeds if !care.has_weeds => return Ok(()),
        CareActionKind::PestControl if !care.has_pests => return Ok(()),
        _ => {}
    }

    if session.score < cost {
        return Err(ActionError::InsufficientPoints {
            needed: cost,
            available: session.score,
        });
    }
    session.score -= cost;

    let day = care.day;
    let amount = match action {
        CareActionKind::Water => {
            care.water = (care.water + params.water_amount).min(100.0);
            params.water_amount
        }
        CareActionKind::Sunlight => {
            care.sunlight = (care.sunlight + params.sunlight_amount).min(100.0);
            params.sunlight_amount
        }
        CareActionKind::Fertilize => {
            care.soil = (care.soil + params.fertilize_amount).min(100.0);
            care.needs_fertilizer = false;
            params.fertilize_amount
        }
        CareActionKind::RemoveWeeds => {
            care.has_weeds = false;
            care.soil = (care.soil + params.weed_soil_bonus).min(100.0);
            params.weed_soil_bonus
        }
        CareActionKind::PestControl => {
            care.has_pests = false;
            care.health = (care.health + params.pest_health_bonus).min(100.0);
            params.pest_health_bonus
        }
    };

    care.push_history(CareLogEntry { day, action, amount });
    Ok(())
}

/// Per-tick passive score accrual from plant condition.
pub fn passive_score(care: &CareState) -> i64 {
    (((care.health / 10.0).floor() as i64) + care.stage as i64 * 5).max(0)
}
