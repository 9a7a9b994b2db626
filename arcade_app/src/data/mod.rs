//! Guild settings and user statistics.

pub mod cache;
pub mod model;
pub mod store;

pub use cache::Cache;
pub use model::{GuildId, GuildSettings, GuildSettingsPatch, Outcome, UserData, UserDataPatch};
pub use store::{AppStore, JsonStore, MemoryStore, Store};
