use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Upper bound of the play field in both axes. All positions are percentage
/// coordinates in `[0, 100]`; the rendering surface maps them to pixels.
pub const FIELD_MAX: f64 = 100.0;

/// A transient, positioned, typed object inside one mini-game's play field.
///
/// `kind` indexes into the owning game's kind table (`KindParams`), which
/// carries the name, scoring, and target-bin data. `value` is a per-entity
/// numeric attribute used by the air-monitor game as the pollutant level;
/// other games leave it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEntity {
    pub id: u32,
    pub kind: usize,
    pub pos: DVec2,
    pub size: f64,
    pub speed: f64,
    pub value: f64,
    pub consumed: bool,
}

impl SimEntity {
    pub fn new(id: u32, kind: usize, x: f64, y: f64) -> Self {
        SimEntity {
            id,
            kind,
            pos: DVec2::new(x, y),
            size: 20.0,
            speed: 0.0,
            value: 0.0,
            consumed: false,
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.pos.x >= 0.0
            && self.pos.x <= FIELD_MAX
            && self.pos.y >= 0.0
            && self.pos.y <= FIELD_MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_is_live() {
        let e = SimEntity::new(7, 2, 10.0, 20.0);
        assert_eq!(e.id, 7);
        assert_eq!(e.kind, 2);
        assert!(!e.consumed);
        assert!(e.in_bounds());
    }

    #[test]
    fn out_of_bounds_detected() {
        let mut e = SimEntity::new(0, 0, 50.0, 50.0);
        e.pos.y = 101.0;
        assert!(!e.in_bounds());
        e.pos.y = 100.0;
        assert!(e.in_bounds());
    }
}
