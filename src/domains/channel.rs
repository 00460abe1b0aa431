//! Channel Module
//!
//! Cached access to channels, per-user channel lists and member lists.
//!
//! Every cached entry that embeds a channel is tagged with that channel, so a
//! write to one channel drops its own entry, its member list and each user
//! list containing it. User lists are also tagged with the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::domains::read_through::ReadThrough;
use crate::error::UpstreamResult;

pub const CHANNEL_TTL: Duration = Duration::from_secs(5 * 60);
pub const CHANNEL_LIST_TTL: Duration = Duration::from_secs(60);
pub const MEMBER_LIST_TTL: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Active,
    Archived,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner_id: String,
    pub status: ChannelStatus,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChannel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Tag carried by every entry that embeds the channel.
pub fn channel_tag(channel_id: &str) -> String {
    CacheKey::new("channel").arg(channel_id).into()
}

/// Tag carried by every per-user channel list.
pub fn user_tag(user_id: &str) -> String {
    CacheKey::new("user").arg(user_id).into()
}

// == Channel Source ==
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn channel(&self, id: &str) -> UpstreamResult<Option<Channel>>;
    async fn channels_for_user(&self, user_id: &str) -> UpstreamResult<Vec<Channel>>;
    async fn members(&self, channel_id: &str) -> UpstreamResult<Vec<String>>;
    async fn create_channel(&self, channel: NewChannel) -> UpstreamResult<Channel>;
    async fn update_channel(&self, id: &str, update: ChannelUpdate) -> UpstreamResult<Channel>;
    async fn update_status(&self, id: &str, status: ChannelStatus) -> UpstreamResult<()>;
    async fn delete_channel(&self, id: &str) -> UpstreamResult<bool>;
    async fn add_member(&self, channel_id: &str, user_id: &str) -> UpstreamResult<()>;
    async fn remove_member(&self, channel_id: &str, user_id: &str) -> UpstreamResult<()>;
}

// == Cached Channel Source ==
pub struct CachedChannelSource<S> {
    inner: S,
    read_through: ReadThrough,
}

impl<S: ChannelSource> CachedChannelSource<S> {
    pub fn new(inner: S, cache: Arc<CacheStore>) -> Self {
        Self {
            inner,
            read_through: ReadThrough::new(cache, "channels"),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached channel entry.
    pub fn clear_cache(&self) -> usize {
        self.read_through.invalidate_all()
    }

    /// Membership check served from the cached member list.
    pub async fn is_member(&self, channel_id: &str, user_id: &str) -> UpstreamResult<bool> {
        let members = self.members(channel_id).await?;
        Ok(members.iter().any(|m| m == user_id))
    }

    fn invalidate_channel(&self, channel_id: &str) {
        self.read_through
            .invalidate(Vec::new(), [channel_tag(channel_id)]);
    }

    fn invalidate_membership(&self, channel_id: &str, user_id: &str) {
        let keys = [
            CacheKey::new("members").arg(channel_id),
            CacheKey::new("channel").arg(channel_id),
            CacheKey::new("channels").arg(user_id),
        ];
        self.read_through.invalidate(keys, Vec::new());
    }
}

#[async_trait]
impl<S: ChannelSource> ChannelSource for CachedChannelSource<S> {
    async fn channel(&self, id: &str) -> UpstreamResult<Option<Channel>> {
        let key = CacheKey::new("channel").arg(id);
        self.read_through
            .fetch_optional(
                &key,
                CHANNEL_TTL,
                |c: &Channel| vec![channel_tag(&c.id)],
                || self.inner.channel(id),
            )
            .await
    }

    async fn channels_for_user(&self, user_id: &str) -> UpstreamResult<Vec<Channel>> {
        let key = CacheKey::new("channels").arg(user_id);
        self.read_through
            .fetch(
                &key,
                CHANNEL_LIST_TTL,
                |channels: &Vec<Channel>| {
                    channels
                        .iter()
                        .map(|c| channel_tag(&c.id))
                        .chain(std::iter::once(user_tag(user_id)))
                        .collect()
                },
                || self.inner.channels_for_user(user_id),
            )
            .await
    }

    async fn members(&self, channel_id: &str) -> UpstreamResult<Vec<String>> {
        let key = CacheKey::new("members").arg(channel_id);
        self.read_through
            .fetch(
                &key,
                MEMBER_LIST_TTL,
                |_: &Vec<String>| vec![channel_tag(channel_id)],
                || self.inner.members(channel_id),
            )
            .await
    }

    async fn create_channel(&self, channel: NewChannel) -> UpstreamResult<Channel> {
        let owner = channel.owner_id.clone();
        let created = self.inner.create_channel(channel).await?;
        self.read_through.invalidate(Vec::new(), [user_tag(&owner)]);
        Ok(created)
    }

    async fn update_channel(&self, id: &str, update: ChannelUpdate) -> UpstreamResult<Channel> {
        let updated = self.inner.update_channel(id, update).await?;
        self.invalidate_channel(id);
        Ok(updated)
    }

    async fn update_status(&self, id: &str, status: ChannelStatus) -> UpstreamResult<()> {
        self.inner.update_status(id, status).await?;
        self.invalidate_channel(id);
        Ok(())
    }

    async fn delete_channel(&self, id: &str) -> UpstreamResult<bool> {
        let deleted = self.inner.delete_channel(id).await?;
        if deleted {
            self.invalidate_channel(id);
        }
        Ok(deleted)
    }

    async fn add_member(&self, channel_id: &str, user_id: &str) -> UpstreamResult<()> {
        self.inner.add_member(channel_id, user_id).await?;
        self.invalidate_membership(channel_id, user_id);
        Ok(())
    }

    async fn remove_member(&self, channel_id: &str, user_id: &str) -> UpstreamResult<()> {
        self.inner.remove_member(channel_id, user_id).await?;
        self.invalidate_membership(channel_id, user_id);
        Ok(())
    }
}
