use crate::session::GameSession;

/// True when the given tick crosses a simulated-second boundary.
pub fn second_elapsed(tick_count: u64, ticks_per_second: u32) -> bool {
    let tps = ticks_per_second.max(1) as u64;
    tick_count % tps == 0
}

/// Decrement the countdown by one second. Returns true exactly when this
/// call reached zero; an already-expired or untimed session returns false,
/// so expiry is a one-time transition.
pub fn tick_countdown(session: &mut GameSession) -> bool {
    match session.time_remaining {
        Some(t) if t > 0 => {
            session.time_remaining = Some(t - 1);
            t == 1
        }
        _ => false,
    }
}

/// Award bonus seconds, clamped to the cap. No-op on untimed sessions.
pub fn grant_bonus(session: &mut GameSession, bonus: u32, cap: u32) {
    if bonus == 0 {
        return;
    }
    if let Some(t) = session.time_remaining {
        session.time_remaining = Some((t + bonus).min(cap));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Difficulty, GameKind, GameSession, Mode};

    fn timed_session(secs: u32) -> GameSession {
        let mut s = GameSession::new(GameKind::BalloonPop, Mode::Classic, Difficulty::Mixed);
        s.time_remaining = Some(secs);
        s
    }

    #[test]
    fn second_boundary_at_multiples_of_tps() {
        assert!(second_elapsed(20, 20));
        assert!(second_elapsed(40, 20));
        assert!(!second_elapsed(21, 20));
        assert!(second_elapsed(1, 1));
        assert!(second_elapsed(2, 1));
    }

    #[test]
    fn countdown_reaches_zero_exactly_once() {
        let mut s = timed_session(3);
        assert!(!tick_countdown(&mut s));
        assert!(!tick_countdown(&mut s));
        assert!(tick_countdown(&mut s));
        assert_eq!(s.time_remaining, Some(0));

        // A further tick must not go below zero nor re-signal expiry
        assert!(!tick_countdown(&mut s));
        assert_eq!(s.time_remaining, Some(0));
    }

    #[test]
    fn untimed_session_never_expires() {
        let mut s = GameSession::new(GameKind::WasteSort, Mode::Classic, Difficulty::Mixed);
        assert!(s.time_remaining.is_none());
        assert!(!tick_countdown(&mut s));
        assert!(s.time_remaining.is_none());
    }

    #[test]
    fn bonus_clamped_to_cap() {
        let mut s = timed_session(80);
        grant_bonus(&mut s, 15, 90);
        assert_eq!(s.time_remaining, Some(90));
        grant_bonus(&mut s, 15, 90);
        assert_eq!(s.time_remaining, Some(90));
    }

    #[test]
    fn bonus_below_cap_adds_fully() {
        let mut s = timed_session(30);
        grant_bonus(&mut s, 3, 120);
        assert_eq!(s.time_remaining, Some(33));
    }

    #[test]
    fn zero_bonus_is_noop() {
        let mut s = timed_session(30);
        grant_bonus(&mut s, 0, 120);
        assert_eq!(s.time_remaining, Some(30));
    }
}
