//! Invitation Module
//!
//! Cached access to a user's pending invitations and invitation statistics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::domains::read_through::{no_tags, ReadThrough};
use crate::error::UpstreamResult;

pub const INVITATIONS_TTL: Duration = Duration::from_secs(60);
pub const INVITE_STATS_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub channel_id: String,
    pub inviter_id: String,
    pub invitee_id: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub channel_id: String,
    pub inviter_id: String,
    pub invitee_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteStats {
    pub sent: u32,
    pub received: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub pending: u32,
}

impl InviteStats {
    /// Share of answered invitations that were accepted, in `[0, 1]`.
    pub fn acceptance_rate(&self) -> f64 {
        let answered = self.accepted + self.rejected;
        if answered == 0 {
            0.0
        } else {
            self.accepted as f64 / answered as f64
        }
    }
}

pub fn invitation_tag(invitation_id: &str) -> String {
    CacheKey::new("invitation").arg(invitation_id).into()
}

// == Invite Source ==
#[async_trait]
pub trait InviteSource: Send + Sync {
    /// Invitations addressed to `user_id`.
    async fn invitations(&self, user_id: &str) -> UpstreamResult<Vec<Invitation>>;
    async fn invite_stats(&self, user_id: &str) -> UpstreamResult<InviteStats>;
    async fn send_invitation(&self, invitation: NewInvitation) -> UpstreamResult<Invitation>;
    async fn respond(&self, invitation_id: &str, accept: bool) -> UpstreamResult<Invitation>;
    async fn cancel(&self, invitation_id: &str) -> UpstreamResult<Invitation>;
}

// == Cached Invite Source ==
/// Read-through decorator over an [`InviteSource`].
///
/// Invitation lists are cached without entries already expired at load time.
pub struct CachedInviteSource<S> {
    inner: S,
    read_through: ReadThrough,
}

impl<S: InviteSource> CachedInviteSource<S> {
    pub fn new(inner: S, cache: Arc<CacheStore>) -> Self {
        Self {
            inner,
            read_through: ReadThrough::new(cache, "invitations"),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached invitation entry.
    pub fn clear_cache(&self) -> usize {
        self.read_through.invalidate_all()
    }

    fn invalidate_for(&self, invitation: &Invitation) {
        let keys = [
            CacheKey::new("invitations").arg(&invitation.inviter_id),
            CacheKey::new("invitations").arg(&invitation.invitee_id),
            CacheKey::new("invite_stats").arg(&invitation.inviter_id),
            CacheKey::new("invite_stats").arg(&invitation.invitee_id),
        ];
        self.read_through
            .invalidate(keys, [invitation_tag(&invitation.id)]);
    }
}

#[async_trait]
impl<S: InviteSource> InviteSource for CachedInviteSource<S> {
    async fn invitations(&self, user_id: &str) -> UpstreamResult<Vec<Invitation>> {
        let key = CacheKey::new("invitations").arg(user_id);
        let now = self.read_through.cache().clock().now();
        self.read_through
            .fetch(
                &key,
                INVITATIONS_TTL,
                |list: &Vec<Invitation>| list.iter().map(|i| invitation_tag(&i.id)).collect(),
                || async move {
                    let mut list = self.inner.invitations(user_id).await?;
                    list.retain(|i| i.expires_at > now);
                    Ok(list)
                },
            )
            .await
    }

    async fn invite_stats(&self, user_id: &str) -> UpstreamResult<InviteStats> {
        let key = CacheKey::new("invite_stats").arg(user_id);
        self.read_through
            .fetch(&key, INVITE_STATS_TTL, no_tags, || {
                self.inner.invite_stats(user_id)
            })
            .await
    }

    async fn send_invitation(&self, invitation: NewInvitation) -> UpstreamResult<Invitation> {
        let sent = self.inner.send_invitation(invitation).await?;
        let keys = [
            CacheKey::new("invitations").arg(&sent.invitee_id),
            CacheKey::new("invite_stats").arg(&sent.inviter_id),
            CacheKey::new("invite_stats").arg(&sent.invitee_id),
        ];
        self.read_through.invalidate(keys, Vec::new());
        Ok(sent)
    }

    async fn respond(&self, invitation_id: &str, accept: bool) -> UpstreamResult<Invitation> {
        let answered = self.inner.respond(invitation_id, accept).await?;
        self.invalidate_for(&answered);
        Ok(answered)
    }

    async fn cancel(&self, invitation_id: &str) -> UpstreamResult<Invitation> {
        let cancelled = self.inner.cancel(invitation_id).await?;
        self.invalidate_for(&cancelled);
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use chrono::Duration as ChronoDuration;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeInvites {
        rows: Mutex<Vec<Invitation>>,
        reads: AtomicUsize,
    }

    impl FakeInvites {
        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn set_status(&self, id: &str, status: InvitationStatus) -> UpstreamResult<Invitation> {
            let mut rows = self.rows.lock();
            let row = rows
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| UpstreamError::NotFound(id.to_string()))?;
            if row.status != InvitationStatus::Pending {
                return Err(UpstreamError::Rejected(format!("{} already answered", id)));
            }
            row.status = status;
            Ok(row.clone())
        }
    }

    #[async_trait]
    impl InviteSource for FakeInvites {
        async fn invitations(&self, user_id: &str) -> UpstreamResult<Vec<Invitation>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .lock()
                .iter()
                .filter(|i| i.invitee_id == user_id && i.status == InvitationStatus::Pending)
                .cloned()
                .collect())
        }

        async fn invite_stats(&self, user_id: &str) -> UpstreamResult<InviteStats> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let rows = self.rows.lock();
            let mut stats = InviteStats::default();
            for row in rows.iter() {
                if row.inviter_id == user_id {
                    stats.sent += 1;
                }
                if row.invitee_id == user_id {
                    stats.received += 1;
                    match row.status {
                        InvitationStatus::Accepted => stats.accepted += 1,
                        InvitationStatus::Rejected => stats.rejected += 1,
                        InvitationStatus::Pending => stats.pending += 1,
                        InvitationStatus::Cancelled => {}
                    }
                }
            }
            Ok(stats)
        }

        async fn send_invitation(&self, invitation: NewInvitation) -> UpstreamResult<Invitation> {
            let mut rows = self.rows.lock();
            let sent = Invitation {
                id: format!("inv{}", rows.len() + 1),
                channel_id: invitation.channel_id,
                inviter_id: invitation.inviter_id,
                invitee_id: invitation.invitee_id,
                status: InvitationStatus::Pending,
                expires_at: Utc::now() + ChronoDuration::days(7),
            };
            rows.push(sent.clone());
            Ok(sent)
        }

        async fn respond(&self, invitation_id: &str, accept: bool) -> UpstreamResult<Invitation> {
            let status = if accept {
                InvitationStatus::Accepted
            } else {
                InvitationStatus::Rejected
            };
            self.set_status(invitation_id, status)
        }

        async fn cancel(&self, invitation_id: &str) -> UpstreamResult<Invitation> {
            self.set_status(invitation_id, InvitationStatus::Cancelled)
        }
    }

    fn cached(fake: FakeInvites) -> CachedInviteSource<FakeInvites> {
        CachedInviteSource::new(fake, Arc::new(CacheStore::new(Duration::from_secs(60))))
    }

    fn invite(from: &str, to: &str) -> NewInvitation {
        NewInvitation {
            channel_id: "dev".to_string(),
            inviter_id: from.to_string(),
            invitee_id: to.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_invalidates_invitee_and_stats() {
        let source = cached(FakeInvites::default());

        assert!(source.invitations("bob").await.unwrap().is_empty());
        assert_eq!(source.invite_stats("alice").await.unwrap().sent, 0);
        source.invitations("bob").await.unwrap();
        assert_eq!(source.inner().reads(), 2);

        source.send_invitation(invite("alice", "bob")).await.unwrap();

        assert_eq!(source.invitations("bob").await.unwrap().len(), 1);
        assert_eq!(source.invite_stats("alice").await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reload() {
        let source = cached(FakeInvites::default());

        source.invitations("bob").await.unwrap();
        source.invite_stats("alice").await.unwrap();
        assert_eq!(source.clear_cache(), 2);

        source.invitations("bob").await.unwrap();
        assert_eq!(source.inner().reads(), 3);
    }

    #[tokio::test]
    async fn test_respond_invalidates_both_users() {
        let source = cached(FakeInvites::default());
        let sent = source.send_invitation(invite("alice", "bob")).await.unwrap();

        assert_eq!(source.invitations("bob").await.unwrap().len(), 1);
        source.invite_stats("bob").await.unwrap();

        let answered = source.respond(&sent.id, true).await.unwrap();
        assert_eq!(answered.status, InvitationStatus::Accepted);

        assert!(source.invitations("bob").await.unwrap().is_empty());
        let stats = source.invite_stats("bob").await.unwrap();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.acceptance_rate(), 1.0);
    }

    #[tokio::test]
    async fn test_cancel_and_double_answer() {
        let source = cached(FakeInvites::default());
        let sent = source.send_invitation(invite("alice", "bob")).await.unwrap();
        source.invitations("bob").await.unwrap();

        source.cancel(&sent.id).await.unwrap();
        assert!(source.invitations("bob").await.unwrap().is_empty());

        let err = source.respond(&sent.id, true).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_expired_invitations_are_dropped() {
        let fake = FakeInvites::default();
        fake.rows.lock().push(Invitation {
            id: "old".to_string(),
            channel_id: "dev".to_string(),
            inviter_id: "alice".to_string(),
            invitee_id: "bob".to_string(),
            status: InvitationStatus::Pending,
            expires_at: Utc::now() - ChronoDuration::hours(1),
        });
        let source = cached(fake);

        assert!(source.invitations("bob").await.unwrap().is_empty());
    }

    #[test]
    fn test_acceptance_rate_without_answers() {
        assert_eq!(InviteStats::default().acceptance_rate(), 0.0);
    }
}
