use serde::Deserialize;
use std::path::Path;

use crate::session::{Difficulty, GameKind};

/// One entry in a game's kind table: the type tag plus its scoring and
/// placement parameters. Weights need not sum to 1; the spawner treats the
/// last kind as the fallback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KindParams {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub points: i64,
    /// Score for entities above the game's size bonus threshold.
    #[serde(default)]
    pub points_large: Option<i64>,
    /// Correct bin index for sorting games.
    #[serde(default)]
    pub bin: Option<usize>,
    /// Restricts this kind to one difficulty; `None` means any.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Air-monitor: a gauge that must not be cleaned.
    #[serde(default)]
    pub safe: bool,
    /// Air-monitor: level reduction per clean action.
    #[serde(default)]
    pub clean_rate: f64,
    #[serde(default = "default_size_range")]
    pub size_range: (f64, f64),
    #[serde(default)]
    pub speed_range: (f64, f64),
    /// Air-monitor: initial gauge level range.
    #[serde(default)]
    pub value_range: (f64, f64),
}

fn default_weight() -> f64 {
    1.0
}
fn default_size_range() -> (f64, f64) {
    (20.0, 20.0)
}

impl KindParams {
    fn new(name: &str, weight: f64, points: i64) -> Self {
        KindParams {
            name: name.to_string(),
            weight,
            points,
            points_large: None,
            bin: None,
            difficulty: None,
            safe: false,
            clean_rate: 0.0,
            size_range: default_size_range(),
            speed_range: (0.0, 0.0),
            value_range: (0.0, 0.0),
        }
    }

    pub fn points_for_size(&self, size: f64, threshold: f64) -> i64 {
        match self.points_large {
            Some(large) if size > threshold => large,
            _ => self.points,
        }
    }

    pub fn matches_difficulty(&self, difficulty: Difficulty) -> bool {
        difficulty == Difficulty::Mixed
            || self.difficulty.is_none()
            || self.difficulty == Some(difficulty)
    }
}

/// How a game populates its play field.
///
/// Uses a flat struct (not a tagged enum) for TOML compatibility.
/// `mode` is "batch", "stream", "queue", "gauges", or "none".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    pub mode: String,
    /// Batch/queue size.
    pub count: u32,
    /// Extra batch items per level.
    pub per_level: u32,
    /// Stream period in engine ticks.
    pub every_ticks: u32,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Default for SpawnParams {
    fn default() -> Self {
        SpawnParams {
            mode: "none".to_string(),
            count: 0,
            per_level: 0,
            every_ticks: 18,
            x_range: (0.0, 85.0),
            y_range: (0.0, 0.0),
        }
    }
}

impl SpawnParams {
    pub fn is_batch(&self) -> bool {
        self.mode == "batch"
    }
    pub fn is_stream(&self) -> bool {
        self.mode == "stream"
    }
    pub fn is_queue(&self) -> bool {
        self.mode == "queue"
    }
    pub fn is_gauges(&self) -> bool {
        self.mode == "gauges"
    }

    pub fn batch_size(&self, level: u32) -> u32 {
        self.count + self.per_level * level
    }
}

/// Numeric table for the plant-care decay model. Every constant of the care
/// simulation lives here so variants can be tuned without touching logic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CareParams {
    pub initial_water: f64,
    pub initial_sunlight: f64,
    pub initial_soil: f64,
    pub initial_health: f64,
    pub water_decay: f64,
    pub sunlight_decay: f64,
    pub soil_decay: f64,
    pub sunny_water_extra: f64,
    pub cloudy_sunlight_extra: f64,
    pub high_care_threshold: f64,
    pub low_care_threshold: f64,
    pub healthy_delta: f64,
    pub neglect_delta: f64,
    pub weeds_penalty: f64,
    pub pests_penalty: f64,
    pub fertilizer_penalty: f64,
    pub low_soil_threshold: f64,
    pub rain_bonus: f64,
    pub rain_water_threshold: f64,
    pub cold_penalty: f64,
    pub weeds_prob: f64,
    pub pests_prob: f64,
    pub fertilizer_prob: f64,
    pub growth_prob: f64,
    pub growth_health_threshold: f64,
    pub growth_care_threshold: f64,
    pub max_stage: u32,
    pub water_amount: f64,
    pub sunlight_amount: f64,
    pub fertilize_amount: f64,
    pub weed_soil_bonus: f64,
    pub pest_health_bonus: f64,
    pub fertilize_cost: i64,
    pub weed_cost: i64,
    pub pest_cost: i64,
    pub weather_change_days: u32,
    pub season_change_days: u32,
}

impl Default for CareParams {
    fn default() -> Self {
        CareParams {
            initial_water: 50.0,
            initial_sunlight: 50.0,
            initial_soil: 50.0,
            initial_health: 75.0,
            water_decay: 2.0,
            sunlight_decay: 1.0,
            soil_decay: 0.5,
            sunny_water_extra: 1.0,
            cloudy_sunlight_extra: 1.0,
            high_care_threshold: 70.0,
            low_care_threshold: 40.0,
            healthy_delta: 2.0,
            neglect_delta: -3.0,
            weeds_penalty: 2.0,
            pests_penalty: 3.0,
            fertilizer_penalty: 1.0,
            low_soil_threshold: 30.0,
            rain_bonus: 1.0,
            rain_water_threshold: 70.0,
            cold_penalty: 1.0,
            weeds_prob: 0.04,
            pests_prob: 0.03,
            fertilizer_prob: 0.05,
            growth_prob: 0.3,
            growth_health_threshold: 80.0,
            growth_care_threshold: 80.0,
            max_stage: 5,
            water_amount: 30.0,
            sunlight_amount: 25.0,
            fertilize_amount: 40.0,
            weed_soil_bonus: 10.0,
            pest_health_bonus: 15.0,
            fertilize_cost: 10,
            weed_cost: 5,
            pest_cost: 15,
            weather_change_days: 7,
            season_change_days: 30,
        }
    }
}

/// The complete parameter table for one mini-game. Treats every observed
/// scoring/decay constant as configuration rather than hardcoded logic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameParams {
    pub kinds: Vec<KindParams>,
    #[serde(default)]
    pub spawn: SpawnParams,
    #[serde(default)]
    pub bins: Vec<String>,
    /// Classic-mode duration in seconds; `None` means untimed.
    #[serde(default)]
    pub initial_time: Option<u32>,
    #[serde(default = "default_time_cap")]
    pub time_cap: u32,
    #[serde(default)]
    pub time_bonus_per_correct: u32,
    #[serde(default)]
    pub level_time_bonus: u32,
    #[serde(default)]
    pub auto_advance_levels: bool,
    #[serde(default = "default_true")]
    pub clear_on_exhausted: bool,
    #[serde(default)]
    pub win_score: Option<i64>,
    #[serde(default)]
    pub clamp_score_floor: bool,
    #[serde(default)]
    pub lose_on_zero: bool,
    /// Fraction of base points awarded on a wrong-bin sort.
    #[serde(default)]
    pub wrong_sort_fraction: f64,
    /// Score delta for entities escaping the field uncaught; 0 = silent.
    #[serde(default)]
    pub escape_penalty: i64,
    #[serde(default = "default_size_bonus_threshold")]
    pub size_bonus_threshold: f64,
    #[serde(default)]
    pub entities_fall: bool,
    #[serde(default = "default_collector_width")]
    pub collector_width: f64,
    #[serde(default = "default_collector_step")]
    pub collector_step: f64,
    #[serde(default = "default_collector_zone_y")]
    pub collector_zone_y: f64,
    #[serde(default)]
    pub action_budget: Option<u32>,
    #[serde(default)]
    pub activate_points: i64,
    #[serde(default)]
    pub safe_touch_penalty: i64,
    #[serde(default = "default_target_level")]
    pub target_level: f64,
    #[serde(default = "default_clean_jitter")]
    pub clean_jitter: f64,
    #[serde(default = "default_timed_duration")]
    pub timed_duration: u32,
    #[serde(default = "default_speed_duration")]
    pub speed_duration: u32,
    /// Queue length override for Timed/Speed modes.
    #[serde(default)]
    pub timed_queue_count: Option<u32>,
    #[serde(default = "default_care_period_secs")]
    pub care_period_secs: u32,
    #[serde(default)]
    pub care: Option<CareParams>,
}

fn default_time_cap() -> u32 {
    120
}
fn default_true() -> bool {
    true
}
fn default_size_bonus_threshold() -> f64 {
    40.0
}
fn default_collector_width() -> f64 {
    15.0
}
fn default_collector_step() -> f64 {
    8.0
}
fn default_collector_zone_y() -> f64 {
    85.0
}
fn default_target_level() -> f64 {
    25.0
}
fn default_clean_jitter() -> f64 {
    5.0
}
fn default_timed_duration() -> u32 {
    120
}
fn default_speed_duration() -> u32 {
    60
}
fn default_care_period_secs() -> u32 {
    3
}

fn base_params(kinds: Vec<KindParams>) -> GameParams {
    GameParams {
        kinds,
        spawn: SpawnParams::default(),
        bins: Vec::new(),
        initial_time: None,
        time_cap: default_time_cap(),
        time_bonus_per_correct: 0,
        level_time_bonus: 0,
        auto_advance_levels: false,
        clear_on_exhausted: true,
        win_score: None,
        clamp_score_floor: false,
        lose_on_zero: false,
        wrong_sort_fraction: 0.0,
        escape_penalty: 0,
        size_bonus_threshold: default_size_bonus_threshold(),
        entities_fall: false,
        collector_width: default_collector_width(),
        collector_step: default_collector_step(),
        collector_zone_y: default_collector_zone_y(),
        action_budget: None,
        activate_points: 0,
        safe_touch_penalty: 0,
        target_level: default_target_level(),
        clean_jitter: default_clean_jitter(),
        timed_duration: default_timed_duration(),
        speed_duration: default_speed_duration(),
        timed_queue_count: None,
        care_period_secs: default_care_period_secs(),
        care: None,
    }
}

fn sort_item(name: &str, bin: usize, points: i64) -> KindParams {
    KindParams {
        bin: Some(bin),
        ..KindParams::new(name, 1.0, points)
    }
}

fn gauge(name: &str, clean_rate: f64, lo: f64, hi: f64) -> KindParams {
    KindParams {
        clean_rate,
        value_range: (lo, hi),
        ..KindParams::new(name, 1.0, 0)
    }
}

impl GameParams {
    /// Click clean-air balloons, avoid smoke clouds. 30 seconds, 20-item
    /// field, bigger balloons are worth more.
    pub fn balloon_pop() -> Self {
        GameParams {
            spawn: SpawnParams {
                mode: "batch".to_string(),
                count: 20,
                x_range: (0.0, 85.0),
                y_range: (0.0, 80.0),
                ..SpawnParams::default()
            },
            initial_time: Some(30),
            time_cap: 30,
            win_score: Some(100),
            clamp_score_floor: true,
            lose_on_zero: true,
            ..base_params(vec![
                KindParams {
                    points_large: Some(8),
                    size_range: (30.0, 50.0),
                    speed_range: (0.5, 1.5),
                    ..KindParams::new("balloon", 0.6, 5)
                },
                KindParams {
                    size_range: (30.0, 50.0),
                    speed_range: (0.5, 1.5),
                    ..KindParams::new("smoke", 0.4, -3)
                },
            ])
        }
    }

    /// Catch falling clean air and bonus stars with a movable purifier,
    /// avoid pollution and penalty items. 45 seconds, streaming spawn.
    pub fn purifier_catch() -> Self {
        let falling = |name: &str, weight: f64, points: i64, size: f64| KindParams {
            size_range: (size, size),
            speed_range: (1.5, 3.0),
            ..KindParams::new(name, weight, points)
        };
        GameParams {
            spawn: SpawnParams {
                mode: "stream".to_string(),
                every_ticks: 18,
                x_range: (0.0, 75.0),
                y_range: (0.0, 0.0),
                ..SpawnParams::default()
            },
            initial_time: Some(45),
            time_cap: 45,
            win_score: Some(100),
            clamp_score_floor: true,
            lose_on_zero: true,
            entities_fall: true,
            ..base_params(vec![
                falling("clean", 0.4, 8, 20.0),
                falling("dirty", 0.35, -5, 20.0),
                falling("bonus", 0.15, 15, 25.0),
                falling("penalty", 0.1, -10, 20.0),
            ])
        }
    }

    /// Drag river trash into the recycle or general bin. Wrong bin awards
    /// half points and breaks the streak; clearing a batch starts the next
    /// level with more trash and bonus time.
    pub fn river_cleanup() -> Self {
        GameParams {
            spawn: SpawnParams {
                mode: "batch".to_string(),
                count: 5,
                per_level: 1,
                x_range: (5.0, 90.0),
                y_range: (10.0, 60.0),
                ..SpawnParams::default()
            },
            bins: vec!["recycle".to_string(), "trash".to_string()],
            initial_time: Some(60),
            time_cap: 90,
            level_time_bonus: 15,
            auto_advance_levels: true,
            clear_on_exhausted: false,
            wrong_sort_fraction: 0.5,
            ..base_params(vec![
                sort_item("plastic-bottle", 0, 25),
                sort_item("plastic-bag", 1, 20),
                sort_item("metal-can", 0, 30),
                sort_item("glass-bottle", 0, 35),
                sort_item("cardboard", 0, 15),
                sort_item("battery", 1, 50),
                sort_item("old-shoe", 1, 40),
                sort_item("phone", 1, 60),
            ])
        }
    }

    /// Sort a 15-item queue into biodegradable vs. non-biodegradable.
    /// Untimed in Classic; Timed/Speed modes add a countdown with per-answer
    /// bonus seconds and a longer queue.
    pub fn waste_sort() -> Self {
        let bio = |name: &str| sort_item(name, 0, 10);
        let non = |name: &str| sort_item(name, 1, 10);
        GameParams {
            spawn: SpawnParams {
                mode: "queue".to_string(),
                count: 15,
                ..SpawnParams::default()
            },
            bins: vec![
                "biodegradable".to_string(),
                "non-biodegradable".to_string(),
            ],
            time_bonus_per_correct: 3,
            timed_queue_count: Some(20),
            ..base_params(vec![
                bio("banana-peel"),
                non("plastic-bottle"),
                bio("paper"),
                non("metal-can"),
                bio("apple-core"),
                non("glass-bottle"),
                bio("cardboard-box"),
                non("plastic-bag"),
                bio("orange-peel"),
                non("aluminum-foil"),
                bio("newspaper"),
                non("styrofoam-cup"),
                bio("vegetable-scraps"),
                non("rubber-tire"),
                bio("cotton-shirt"),
                non("plastic-toy"),
                bio("tea-bag"),
                non("circuit-board"),
                bio("wooden-stick"),
                non("ceramic-plate"),
                bio("bread-crumbs"),
                non("nylon-rope"),
                bio("eggshells"),
                non("battery"),
                bio("leather-belt"),
            ])
        }
    }

    /// Keep a plant alive against decay, weather, and hazards. Untimed;
    /// the session ends when health reaches zero.
    pub fn plant_care() -> Self {
        GameParams {
            care: Some(CareParams::default()),
            ..base_params(Vec::new())
        }
    }

    /// Reduce five pollutant gauges below the target level with a limited
    /// action budget; leave the oxygen gauge alone.
    pub fn air_monitor() -> Self {
        GameParams {
            spawn: SpawnParams {
                mode: "gauges".to_string(),
                ..SpawnParams::default()
            },
            initial_time: Some(60),
            time_cap: 60,
            win_score: Some(100),
            clamp_score_floor: true,
            lose_on_zero: true,
            action_budget: Some(25),
            activate_points: 6,
            safe_touch_penalty: -8,
            ..base_params(vec![
                gauge("co2", 15.0, 60.0, 100.0),
                gauge("pm25", 12.0, 70.0, 100.0),
                gauge("ozone", 18.0, 50.0, 90.0),
                gauge("no2", 14.0, 40.0, 90.0),
                gauge("so2", 20.0, 30.0, 70.0),
                KindParams {
                    safe: true,
                    value_range: (80.0, 95.0),
                    ..KindParams::new("oxygen", 1.0, 0)
                },
            ])
        }
    }
}

/// The full roster of game tables, overridable from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub balloon_pop: GameParams,
    pub purifier_catch: GameParams,
    pub river_cleanup: GameParams,
    pub waste_sort: GameParams,
    pub plant_care: GameParams,
    pub air_monitor: GameParams,
}

impl Default for GamesConfig {
    fn default() -> Self {
        GamesConfig {
            balloon_pop: GameParams::balloon_pop(),
            purifier_catch: GameParams::purifier_catch(),
            river_cleanup: GameParams::river_cleanup(),
            waste_sort: GameParams::waste_sort(),
            plant_care: GameParams::plant_care(),
            air_monitor: GameParams::air_monitor(),
        }
    }
}

impl GamesConfig {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: GamesConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn params(&self, kind: GameKind) -> &GameParams {
        match kind {
            GameKind::BalloonPop => &self.balloon_pop,
            GameKind::PurifierCatch => &self.purifier_catch,
            GameKind::RiverCleanup => &self.river_cleanup,
            GameKind::WasteSort => &self.waste_sort,
            GameKind::PlantCare => &self.plant_care,
            GameKind::AirMonitor => &self.air_monitor,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        for &kind in GameKind::all() {
            let params = self.params(kind);
            let slug = kind.slug();

            if params.kinds.is_empty() && params.care.is_none() {
                errors.push(format!("{}: kinds must not be empty", slug));
            }

            let total_weight: f64 = params.kinds.iter().map(|k| k.weight).sum();
            if !params.kinds.is_empty() && total_weight <= 0.0 {
                errors.push(format!(
                    "{}: kind weights must sum to > 0, got {}",
                    slug, total_weight
                ));
            }
            for k in &params.kinds {
                if k.weight < 0.0 {
                    errors.push(format!("{}: kind '{}' has negative weight", slug, k.name));
                }
                if let Some(bin) = k.bin {
                    if bin >= params.bins.len() {
                        errors.push(format!(
                            "{}: kind '{}' targets bin {} but only {} bins are defined",
                            slug,
                            k.name,
                            bin,
                            params.bins.len()
                        ));
                    }
                }
            }

            let valid_modes = ["batch", "stream", "queue", "gauges", "none"];
            if !valid_modes.contains(&params.spawn.mode.as_str()) {
                errors.push(format!(
                    "{}: spawn mode must be one of {:?}, got '{}'",
                    slug, valid_modes, params.spawn.mode
                ));
            }
            if params.spawn.is_stream() && params.spawn.every_ticks == 0 {
                errors.push(format!("{}: stream spawn requires every_ticks > 0", slug));
            }

            if !(0.0..=1.0).contains(&params.wrong_sort_fraction) {
                errors.push(format!(
                    "{}: wrong_sort_fraction must be in [0, 1], got {}",
                    slug, params.wrong_sort_fraction
                ));
            }

            if params.collector_width <= 0.0 || params.collector_width >= 100.0 {
                errors.push(format!(
                    "{}: collector_width must be in (0, 100), got {}",
                    slug, params.collector_width
                ));
            }

            if params.care_period_secs == 0 {
                errors.push(format!("{}: care_period_secs must be > 0", slug));
            }

            if let Some(care) = &params.care {
                for (field, value) in [
                    ("weeds_prob", care.weeds_prob),
                    ("pests_prob", care.pests_prob),
                    ("fertilizer_prob", care.fertilizer_prob),
                    ("growth_prob", care.growth_prob),
                ] {
                    if !(0.0..=1.0).contains(&value) {
                        errors.push(format!(
                            "{}: {} must be in [0, 1], got {}",
                            slug, field, value
                        ));
                    }
                }
                if care.weather_change_days == 0 || care.season_change_days == 0 {
                    errors.push(format!(
                        "{}: weather_change_days and season_change_days must be > 0",
                        slug
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
