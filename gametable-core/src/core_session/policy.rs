//! Tunable join behaviour

use serde::{Deserialize, Serialize};

/// Behaviour choices for invite redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// A redemption by an existing member still consumes a use.
    ///
    /// When disabled, existing members re-entering with a valid code join
    /// without touching `uses_count`.
    pub count_repeat_joins: bool,

    /// Let invites for archived sessions admit new players
    pub archived_sessions_accept_joins: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            count_repeat_joins: true,
            archived_sessions_accept_joins: false,
        }
    }
}
