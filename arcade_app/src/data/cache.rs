use arcade_games::UserId;
use dashmap::DashMap;

use super::model::{GuildId, GuildSettings, GuildSettingsPatch, UserData, UserDataPatch};
use super::store::Store;

/// Read-through cache in front of a [`Store`].
///
/// Updates are written to the store first. The cached entry is then replaced
/// with what the store returned, so the cache never runs ahead of it.
#[derive(Debug)]
pub struct Cache<S> {
    store: S,
    guilds: DashMap<GuildId, GuildSettings>,
    users: DashMap<UserId, UserData>,
}

impl<S: Store> Cache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            guilds: DashMap::new(),
            users: DashMap::new(),
        }
    }

    /// Gets a guild's settings.
    ///
    /// # Errors
    ///
    /// Returns `Err` if they aren't cached and the store fails.
    pub async fn guild_settings(&self, guild: GuildId) -> anyhow::Result<GuildSettings> {
        if let Some(settings) = self.guilds.get(&guild) {
            return Ok(settings.clone());
        }

        let settings = self.store.guild_settings(guild).await?;
        self.guilds.insert(guild, settings.clone());
        Ok(settings)
    }

    /// Updates a guild's settings.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the store fails. The cache is unchanged in that case.
    pub async fn update_guild_settings(
        &self,
        guild: GuildId,
        patch: &GuildSettingsPatch,
    ) -> anyhow::Result<GuildSettings> {
        let settings = self.store.update_guild_settings(guild, patch).await?;
        self.guilds.insert(guild, settings.clone());
        Ok(settings)
    }

    /// Gets a user's statistics.
    ///
    /// # Errors
    ///
    /// Returns `Err` if they aren't cached and the store fails.
    pub async fn user_data(&self, user: UserId) -> anyhow::Result<UserData> {
        if let Some(data) = self.users.get(&user) {
            return Ok(data.clone());
        }

        let data = self.store.user_data(user).await?;
        self.users.insert(user, data.clone());
        Ok(data)
    }

    /// Updates a user's statistics.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the store fails. The cache is unchanged in that case.
    pub async fn update_user_data(
        &self,
        user: UserId,
        patch: &UserDataPatch,
    ) -> anyhow::Result<UserData> {
        let data = self.store.update_user_data(user, patch).await?;
        self.users.insert(user, data.clone());
        Ok(data)
    }

    /// The statistics of every known user, straight from the store.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the store fails.
    pub async fn all_user_data(&self) -> anyhow::Result<Vec<(UserId, UserData)>> {
        self.store.all_user_data().await
    }
}
