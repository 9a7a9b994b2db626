//! Persistence for guild settings and user statistics.
//!
//! Updates are upserts: missing records start from their defaults and the
//! last writer wins.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use arcade_games::UserId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::model::{GuildId, GuildSettings, GuildSettingsPatch, UserData, UserDataPatch};

/// Backing storage for [`GuildSettings`] and [`UserData`].
pub trait Store: Send + Sync + 'static {
    /// Loads a guild's settings, or the defaults if it has none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage could not be read.
    fn guild_settings(
        &self,
        guild: GuildId,
    ) -> impl Future<Output = anyhow::Result<GuildSettings>> + Send;

    /// Applies a patch to a guild's settings and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage could not be written.
    fn update_guild_settings(
        &self,
        guild: GuildId,
        patch: &GuildSettingsPatch,
    ) -> impl Future<Output = anyhow::Result<GuildSettings>> + Send;

    /// Loads a user's statistics, or empty ones.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage could not be read.
    fn user_data(&self, user: UserId) -> impl Future<Output = anyhow::Result<UserData>> + Send;

    /// Applies a patch to a user's statistics and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage could not be written.
    fn update_user_data(
        &self,
        user: UserId,
        patch: &UserDataPatch,
    ) -> impl Future<Output = anyhow::Result<UserData>> + Send;

    /// Loads the statistics of every known user.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage could not be read.
    fn all_user_data(&self)
    -> impl Future<Output = anyhow::Result<Vec<(UserId, UserData)>>> + Send;
}

/// Keeps everything in memory. Data is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    guilds: DashMap<GuildId, GuildSettings>,
    users: DashMap<UserId, UserData>,
}

impl MemoryStore {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            guilds: self
                .guilds
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
            users: self
                .users
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
        }
    }

    fn restore(snapshot: Snapshot) -> Self {
        Self {
            guilds: snapshot.guilds.into_iter().collect(),
            users: snapshot.users.into_iter().collect(),
        }
    }
}

impl Store for MemoryStore {
    async fn guild_settings(&self, guild: GuildId) -> anyhow::Result<GuildSettings> {
        Ok(self
            .guilds
            .get(&guild)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn update_guild_settings(
        &self,
        guild: GuildId,
        patch: &GuildSettingsPatch,
    ) -> anyhow::Result<GuildSettings> {
        let mut entry = self.guilds.entry(guild).or_default();
        patch.apply(&mut entry);
        Ok(entry.clone())
    }

    async fn user_data(&self, user: UserId) -> anyhow::Result<UserData> {
        Ok(self
            .users
            .get(&user)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn update_user_data(
        &self,
        user: UserId,
        patch: &UserDataPatch,
    ) -> anyhow::Result<UserData> {
        let mut entry = self.users.entry(user).or_default();
        patch.apply(&mut entry);
        Ok(entry.clone())
    }

    async fn all_user_data(&self) -> anyhow::Result<Vec<(UserId, UserData)>> {
        Ok(self
            .users
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect())
    }
}

/// The file layout of a [`JsonStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Snapshot {
    guilds: BTreeMap<GuildId, GuildSettings>,
    users: BTreeMap<UserId, UserData>,
}

/// A [`MemoryStore`] that rewrites a JSON file after every update.
#[derive(Debug)]
pub struct JsonStore {
    memory: MemoryStore,
    path: PathBuf,
    /// Serializes file writes so the newest snapshot is written last.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonStore {
    /// Opens the store, loading the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let memory = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)
                    .with_context(|| format!("store file {path:?} is invalid"))?;
                log::info!(
                    "Loaded {} guilds and {} users from {path:?}.",
                    snapshot.guilds.len(),
                    snapshot.users.len()
                );
                MemoryStore::restore(snapshot)
            },
            Err(why) if why.kind() == io::ErrorKind::NotFound => {
                log::info!("Store file {path:?} does not exist yet, starting empty.");
                MemoryStore::default()
            },
            Err(why) => {
                return Err(why).with_context(|| format!("cannot read store file {path:?}"));
            },
        };

        Ok(Self {
            memory,
            path,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Applies `apply` to one record and writes the file.
    ///
    /// If the write fails, the record is put back the way it was so memory
    /// never holds state the file doesn't.
    async fn update<K, V>(
        &self,
        map: &DashMap<K, V>,
        key: K,
        apply: impl FnOnce(&mut V),
    ) -> anyhow::Result<V>
    where
        K: Eq + Hash + Copy,
        V: Default + Clone,
    {
        let _guard = self.write_lock.lock().await;
        let previous = map.get(&key).map(|e| e.value().clone());
        let updated = {
            let mut entry = map.entry(key).or_default();
            apply(&mut entry);
            entry.clone()
        };

        if let Err(why) = self.write_file().await {
            match previous {
                Some(previous) => _ = map.insert(key, previous),
                None => _ = map.remove(&key),
            }
            return Err(why);
        }

        Ok(updated)
    }

    /// Requires `write_lock` to be held.
    async fn write_file(&self) -> anyhow::Result<()> {
        let json =
            serde_json::to_vec_pretty(&self.memory.snapshot()).context("cannot serialize store")?;

        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("cannot write store file {:?}", self.path))
    }
}

impl Store for JsonStore {
    async fn guild_settings(&self, guild: GuildId) -> anyhow::Result<GuildSettings> {
        self.memory.guild_settings(guild).await
    }

    async fn update_guild_settings(
        &self,
        guild: GuildId,
        patch: &GuildSettingsPatch,
    ) -> anyhow::Result<GuildSettings> {
        self.update(&self.memory.guilds, guild, |s| patch.apply(s)).await
    }

    async fn user_data(&self, user: UserId) -> anyhow::Result<UserData> {
        self.memory.user_data(user).await
    }

    async fn update_user_data(
        &self,
        user: UserId,
        patch: &UserDataPatch,
    ) -> anyhow::Result<UserData> {
        self.update(&self.memory.users, user, |d| patch.apply(d)).await
    }

    async fn all_user_data(&self) -> anyhow::Result<Vec<(UserId, UserData)>> {
        self.memory.all_user_data().await
    }
}

/// The store picked by the configuration.
#[derive(Debug)]
pub enum AppStore {
    Memory(MemoryStore),
    Json(JsonStore),
}

impl AppStore {
    /// Opens a [`JsonStore`] if a path is given, otherwise a [`MemoryStore`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file exists but cannot be loaded.
    pub async fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Ok(Self::Json(JsonStore::open(path).await?)),
            None => {
                log::warn!("No store path configured. Statistics are lost on exit.");
                Ok(Self::Memory(MemoryStore::default()))
            },
        }
    }
}

impl Store for AppStore {
    async fn guild_settings(&self, guild: GuildId) -> anyhow::Result<GuildSettings> {
        match self {
            Self::Memory(s) => s.guild_settings(guild).await,
            Self::Json(s) => s.guild_settings(guild).await,
        }
    }

    async fn update_guild_settings(
        &self,
        guild: GuildId,
        patch: &GuildSettingsPatch,
    ) -> anyhow::Result<GuildSettings> {
        match self {
            Self::Memory(s) => s.update_guild_settings(guild, patch).await,
            Self::Json(s) => s.update_guild_settings(guild, patch).await,
        }
    }

    async fn user_data(&self, user: UserId) -> anyhow::Result<UserData> {
        match self {
            Self::Memory(s) => s.user_data(user).await,
            Self::Json(s) => s.user_data(user).await,
        }
    }

    async fn update_user_data(
        &self,
        user: UserId,
        patch: &UserDataPatch,
    ) -> anyhow::Result<UserData> {
        match self {
            Self::Memory(s) => s.update_user_data(user, patch).await,
            Self::Json(s) => s.update_user_data(user, patch).await,
        }
    }

    async fn all_user_data(&self) -> anyhow::Result<Vec<(UserId, UserData)>> {
        match self {
            Self::Memory(s) => s.all_user_data().await,
            Self::Json(s) => s.all_user_data().await,
        }
    }
}
