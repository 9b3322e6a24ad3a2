pub mod profile;

pub use profile::{
    GameRecord, PlayerProfile, ProfileError, ProfileMetadata, list_profiles,
    load_latest_valid_profile, load_or_default, load_profile, prune_profiles, save_profile,
};
