//! Session invite codes

use super::errors::InviteRejection;
use super::types::{InviteId, SessionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Redeemable code granting membership in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInvite {
    /// Unique identifier
    pub id: InviteId,

    /// Target session
    pub session_id: SessionId,

    /// Shareable code, unique across all sessions
    pub code: String,

    /// Maximum number of uses (None = unlimited)
    pub max_uses: Option<u32>,

    /// Successful redemptions so far
    pub uses_count: u32,

    /// Optional expiration time
    pub expires_at: Option<Timestamp>,

    /// Master who minted the invite
    pub created_by: UserId,

    /// When the invite was created
    pub created_at: Timestamp,
}

/// Derived display state of an invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Active,
    Expired,
    Exhausted,
}

impl SessionInvite {
    pub fn new(
        session_id: SessionId,
        code: String,
        created_by: UserId,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> Self {
        SessionInvite {
            id: InviteId::generate(),
            session_id,
            code,
            max_uses,
            uses_count: 0,
            expires_at,
            created_by,
            created_at: Timestamp::now(),
        }
    }

    /// Reason the invite cannot be redeemed at `now`, if any.
    ///
    /// Expiry is reported ahead of exhaustion.
    pub fn rejection_at(&self, now: Timestamp) -> Option<InviteRejection> {
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Some(InviteRejection::Expired);
            }
        }

        if let Some(max_uses) = self.max_uses {
            if self.uses_count >= max_uses {
                return Some(InviteRejection::Exhausted);
            }
        }

        None
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.rejection_at(now).is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Timestamp::now())
    }

    pub fn status_at(&self, now: Timestamp) -> InviteStatus {
        match self.rejection_at(now) {
            None => InviteStatus::Active,
            Some(InviteRejection::Expired) => InviteStatus::Expired,
            Some(InviteRejection::Exhausted) => InviteStatus::Exhausted,
        }
    }

    /// Uses left before exhaustion (None = unlimited)
    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses.map(|max| max.saturating_sub(self.uses_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn invite(max_uses: Option<u32>, expires_at: Option<Timestamp>) -> SessionInvite {
        SessionInvite::new(
            SessionId::generate(),
            "DRAGONAB12CD34".into(),
            UserId::from("alice"),
            max_uses,
            expires_at,
        )
    }

    #[test]
    fn test_unlimited_invite_is_valid() {
        let invite = invite(None, None);
        assert_eq!(invite.uses_count, 0);
        assert!(invite.is_valid());
        assert_eq!(invite.remaining_uses(), None);
    }

    #[test]
    fn test_exhausted_invite() {
        let mut invite = invite(Some(2), None);
        invite.uses_count = 2;

        assert_eq!(invite.rejection_at(Timestamp::now()), Some(InviteRejection::Exhausted));
        assert_eq!(invite.status_at(Timestamp::now()), InviteStatus::Exhausted);
        assert_eq!(invite.remaining_uses(), Some(0));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Timestamp::now();
        let invite = invite(None, Some(now));

        // Valid strictly before the expiry instant only
        assert!(invite.is_valid_at(now.before(Duration::from_millis(1))));
        assert!(!invite.is_valid_at(now));
    }

    #[test]
    fn test_expired_reported_before_exhausted() {
        let now = Timestamp::now();
        let mut invite = invite(Some(1), Some(now.before(Duration::from_secs(3600))));
        invite.uses_count = 1;

        assert_eq!(invite.rejection_at(now), Some(InviteRejection::Expired));
        assert_eq!(invite.status_at(now), InviteStatus::Expired);
    }
}
