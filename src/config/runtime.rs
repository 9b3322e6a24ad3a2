use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,
    #[serde(default = "default_websocket_bind")]
    pub websocket_bind: String,
    #[serde(default = "default_profile_directory")]
    pub profile_directory: String,
    #[serde(default = "default_max_profiles")]
    pub max_profiles: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_default_game")]
    pub default_game: String,
    /// Optional path to a games.toml overriding the built-in game tables.
    #[serde(default)]
    pub games_file: Option<String>,
    /// Fixed RNG seed for reproducible sessions; omitted = OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_tick_rate() -> f32 {
    20.0
}
fn default_websocket_port() -> u16 {
    8119
}
fn default_websocket_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_profile_directory() -> String {
    "./profiles".to_string()
}
fn default_max_profiles() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_default_game() -> String {
    "balloon-pop".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_rate_hz: default_tick_rate(),
            websocket_port: default_websocket_port(),
            websocket_bind: default_websocket_bind(),
            profile_directory: default_profile_directory(),
            max_profiles: default_max_profiles(),
            log_level: default_log_level(),
            default_game: default_default_game(),
            games_file: None,
            seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: RuntimeConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Whole engine ticks per simulated second, used by the countdown and
    /// care sub-steps. Derived from the tick rate, never below 1.
    pub fn ticks_per_second(&self) -> u32 {
        (self.tick_rate_hz.round() as u32).max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.tick_rate_hz <= 0.0 {
            errors.push(format!(
                "tick_rate_hz must be > 0.0, got {}. Example: tick_rate_hz = 20.0",
                self.tick_rate_hz
            ));
        }

        if !(1024..=65535).contains(&self.websocket_port) {
            errors.push(format!(
                "websocket_port must be 1024-65535, got {}. Example: websocket_port = 8119",
                self.websocket_port
            ));
        }

        if self.max_profiles == 0 {
            errors.push(format!(
                "max_profiles must be > 0, got {}. Example: max_profiles = 10",
                self.max_profiles
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if crate::session::GameKind::from_slug(&self.default_game).is_none() {
            errors.push(format!(
                "default_game must name a known game, got '{}'. Example: default_game = \"balloon-pop\"",
                self.default_game
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
