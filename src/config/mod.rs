pub mod games;
pub mod runtime;

pub use games::{CareParams, GameParams, GamesConfig, KindParams, SpawnParams};
pub use runtime::RuntimeConfig;
