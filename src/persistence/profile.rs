use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::session::{GameSession, Outcome, SessionPhase};

/// Lifetime aggregates for one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub games_played: u32,
    pub high_score: i64,
    pub best_streak: u32,
    pub total_score: i64,
    pub wins: u32,
    pub losses: u32,
}

/// Process-local session statistics, persisted between runs. Keyed by game
/// slug so the on-disk format is stable against enum reordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub total_sessions: u32,
    pub records: BTreeMap<String, GameRecord>,
}

impl PlayerProfile {
    /// Merge one completed session into the profile. Call exactly once per
    /// terminal transition.
    pub fn record_session(&mut self, session: &GameSession) {
        let record = self
            .records
            .entry(session.game.slug().to_string())
            .or_default();

        record.games_played = record.games_played.saturating_add(1);
        record.high_score = record.high_score.max(session.score);
        record.best_streak = record.best_streak.max(session.best_streak);
        record.total_score = record.total_score.saturating_add(session.score.max(0));
        match session.phase {
            SessionPhase::Completed(Outcome::Won) => {
                record.wins = record.wins.saturating_add(1);
            }
            SessionPhase::Completed(Outcome::Lost) => {
                record.losses = record.losses.saturating_add(1);
            }
            _ => {}
        }

        self.total_sessions = self.total_sessions.saturating_add(1);
    }

    pub fn games_played(&self) -> u32 {
        self.total_sessions
    }

    /// Consistency check used to detect truncated or corrupt files.
    fn is_consistent(&self) -> bool {
        let sum: u32 = self.records.values().map(|r| r.games_played).sum();
        sum == self.total_sessions
    }
}

/// Metadata about a profile file on disk.
#[derive(Debug, Clone)]
pub struct ProfileMetadata {
    pub path: PathBuf,
    pub total_sessions: u32,
    pub timestamp: u64,
    pub file_size: u64,
}

/// Errors that can occur during profile operations.
#[derive(Debug)]
pub enum ProfileError {
    Io(io::Error),
    Serialize(String),
    Deserialize(String),
    Corrupt(PathBuf),
    NoValidProfiles,
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Io(e) => write!(f, "I/O error: {}", e),
            ProfileError::Serialize(e) => write!(f, "Serialization error: {}", e),
            ProfileError::Deserialize(e) => write!(f, "Deserialization error: {}", e),
            ProfileError::Corrupt(path) => write!(f, "Corrupt profile: {}", path.display()),
            ProfileError::NoValidProfiles => write!(f, "No valid profiles found"),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<io::Error> for ProfileError {
    fn from(e: io::Error) -> Self {
        ProfileError::Io(e)
    }
}

/// Build a profile filename from session count and timestamp.
fn profile_filename(total_sessions: u32, timestamp: u64) -> String {
    format!("profile-g{}-{}.bin", total_sessions, timestamp)
}

/// Parse session count and timestamp from a profile filename.
/// Expected format: `profile-g{N}-{timestamp}.bin`
fn parse_profile_filename(filename: &str) -> Option<(u32, u64)> {
    let stem = filename.strip_suffix(".bin")?;
    let rest = stem.strip_prefix("profile-g")?;
    let (count_str, ts_str) = rest.split_once('-')?;
    let count = count_str.parse::<u32>().ok()?;
    let ts = ts_str.parse::<u64>().ok()?;
    Some((count, ts))
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Save a profile to the directory using atomic write.
///
/// Writes to a temporary file first, then atomically renames to the final
/// path, so a partial write never corrupts an existing profile.
pub fn save_profile(profile: &PlayerProfile, dir: &Path) -> Result<PathBuf, ProfileError> {
    fs::create_dir_all(dir)?;

    let ts = unix_timestamp_now();
    let filename = profile_filename(profile.total_sessions, ts);
    let target = dir.join(&filename);
    let tmp = dir.join(format!(".{}.tmp", filename));

    let encoded =
        bincode::serialize(profile).map_err(|e| ProfileError::Serialize(e.to_string()))?;

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(ProfileError::Io(e));
    }

    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(ProfileError::Io(e));
    }

    Ok(target)
}

/// Load a profile from a file, validating internal consistency.
pub fn load_profile(path: &Path) -> Result<PlayerProfile, ProfileError> {
    let data = fs::read(path)?;
    let profile: PlayerProfile =
        bincode::deserialize(&data).map_err(|e| ProfileError::Deserialize(e.to_string()))?;

    if !profile.is_consistent() {
        return Err(ProfileError::Corrupt(path.to_path_buf()));
    }

    Ok(profile)
}

/// List all profile files in a directory, newest first.
pub fn list_profiles(dir: &Path) -> Result<Vec<ProfileMetadata>, ProfileError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        // Skip temp files
        if filename.starts_with('.') {
            continue;
        }

        if let Some((total_sessions, timestamp)) = parse_profile_filename(&filename) {
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            profiles.push(ProfileMetadata {
                path: path.clone(),
                total_sessions,
                timestamp,
                file_size,
            });
        }
    }

    // Newest first, session count as tiebreaker
    profiles.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.total_sessions.cmp(&a.total_sessions))
    });

    Ok(profiles)
}

/// Prune old profiles, keeping only the `max_profiles` most recent.
/// Returns the list of deleted file paths.
pub fn prune_profiles(dir: &Path, max_profiles: usize) -> Result<Vec<PathBuf>, ProfileError> {
    let profiles = list_profiles(dir)?;

    let mut deleted = Vec::new();
    if profiles.len() > max_profiles {
        for profile in &profiles[max_profiles..] {
            fs::remove_file(&profile.path)?;
            deleted.push(profile.path.clone());
        }
    }

    Ok(deleted)
}

/// Load the most recent valid profile, falling back past corrupt files.
/// Errors only if no valid profile exists at all.
pub fn load_latest_valid_profile(dir: &Path) -> Result<PlayerProfile, ProfileError> {
    let profiles = list_profiles(dir)?;

    if profiles.is_empty() {
        return Err(ProfileError::NoValidProfiles);
    }

    for meta in &profiles {
        match load_profile(&meta.path) {
            Ok(profile) => return Ok(profile),
            Err(e) => {
                warn!(
                    path = %meta.path.display(),
                    error = %e,
                    "Corrupt profile, trying next"
                );
            }
        }
    }

    Err(ProfileError::NoValidProfiles)
}

/// Load the newest valid profile, or a fresh default when none exists.
/// Losing the profile is never fatal.
pub fn load_or_default(dir: &Path) -> PlayerProfile {
    match load_latest_valid_profile(dir) {
        Ok(profile) => profile,
        Err(ProfileError::NoValidProfiles) => PlayerProfile::default(),
        Err(e) => {
            warn!(error = %e, "Profile load failed, starting fresh");
            PlayerProfile::default()
        }
    }
}
