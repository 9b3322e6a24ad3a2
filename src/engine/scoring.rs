use crate::config::GameParams;
use crate::session::GameSession;

/// Apply one scoring event to the session and return the applied delta.
///
/// Streak rule: a positive, correct event earns a bonus of `streak / 3`
/// (integer division, streak value before the increment) on top of the base
/// delta, then increments the streak; any non-positive or incorrect event
/// resets the streak to 0. With consecutive positive events the first bonus
/// therefore lands on the 4th hit.
pub fn apply_score(
    session: &mut GameSession,
    params: &GameParams,
    base: i64,
    correct: bool,
) -> i64 {
    let mut delta = base;

    if correct && base > 0 {
        delta += (session.streak / 3) as i64;
        session.streak += 1;
        session.best_streak = session.best_streak.max(session.streak);
    } else {
        session.streak = 0;
    }

    session.score += delta;
    if params.clamp_score_floor && session.score < 0 {
        session.score = 0;
    }
    if session.score > 0 {
        session.score_was_positive = true;
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameParams;
    use crate::session::{Difficulty, GameKind, GameSession, Mode};

    fn session() -> GameSession {
        GameSession::new(GameKind::PurifierCatch, Mode::Classic, Difficulty::Mixed)
    }

    #[test]
    fn streak_bonus_lands_on_fourth_hit() {
        let params = GameParams::purifier_catch();
        let mut s = session();

        let deltas: Vec<i64> = (0..6).map(|_| apply_score(&mut s, &params, 8, true)).collect();
        // Hits 1-3 carry no bonus, hits 4-6 carry +1
        assert_eq!(deltas, vec![8, 8, 8, 9, 9, 9]);
        assert_eq!(s.streak, 6);
        assert_eq!(s.best_streak, 6);
    }

    #[test]
    fn eleven_clean_hits_total_103() {
        // 11 × 8 base plus bonuses 1+1+1+2+2+2+3+3 from the 4th hit on
        let params = GameParams::purifier_catch();
        let mut s = session();
        for _ in 0..11 {
            apply_score(&mut s, &params, 8, true);
        }
        assert_eq!(s.score, 103);
    }

    #[test]
    fn negative_event_resets_streak_to_zero() {
        let params = GameParams::purifier_catch();
        let mut s = session();
        for _ in 0..5 {
            apply_score(&mut s, &params, 8, true);
        }
        assert_eq!(s.streak, 5);

        apply_score(&mut s, &params, -5, false);
        assert_eq!(s.streak, 0);
        assert_eq!(s.best_streak, 5);

        // Streak rebuilds from scratch
        let delta = apply_score(&mut s, &params, 8, true);
        assert_eq!(delta, 8);
        assert_eq!(s.streak, 1);
    }

    #[test]
    fn incorrect_positive_event_awards_points_but_resets_streak() {
        // Wrong-bin sorts still award partial points
        let params = GameParams::river_cleanup();
        let mut s = session();
        apply_score(&mut s, &params, 25, true);
        apply_score(&mut s, &params, 25, true);
        assert_eq!(s.streak, 2);

        let delta = apply_score(&mut s, &params, 12, false);
        assert_eq!(delta, 12);
        assert_eq!(s.streak, 0);
        assert_eq!(s.score, 62);
    }

    #[test]
    fn score_floor_clamps_at_zero_when_configured() {
        let params = GameParams::purifier_catch();
        assert!(params.clamp_score_floor);
        let mut s = session();
        apply_score(&mut s, &params, 8, true);
        apply_score(&mut s, &params, -100, false);
        assert_eq!(s.score, 0);
        assert!(s.score_was_positive);
    }

    #[test]
    fn unclamped_game_allows_negative_score() {
        let mut params = GameParams::purifier_catch();
        params.clamp_score_floor = false;
        let mut s = session();
        apply_score(&mut s, &params, -10, false);
        assert_eq!(s.score, -10);
        assert!(!s.score_was_positive);
    }

    #[test]
    fn zero_delta_event_resets_streak() {
        let params = GameParams::purifier_catch();
        let mut s = session();
        apply_score(&mut s, &params, 8, true);
        apply_score(&mut s, &params, 0, true);
        assert_eq!(s.streak, 0);
    }
}
