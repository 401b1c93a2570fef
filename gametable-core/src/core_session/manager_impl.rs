//! Manager trait implementations: authorization, lifecycle rules and
//! transaction boundaries

use super::character::{CharacterDirectory, SelectionAction, SessionCharacter};
use super::code::InviteCodeGenerator;
use super::errors::{SessionError, SessionResult};
use super::invite::SessionInvite;
use super::manager::{InviteManager, SessionManager};
use super::policy::SessionPolicy;
use super::session::{Session, SessionMember, SessionRole, SessionStatus};
use super::storage::{InviteStore, MembershipStore, SessionCharacterStore, SessionSqlStore};
use super::types::{CharacterId, SessionId, Timestamp, UserId};
use crate::config::Config;
use crate::metrics::{self as session_metrics, record_counter};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates the membership, invite and character stores.
///
/// Every operation runs in exactly one storage transaction, so a failure at
/// any step leaves no partial writes behind.
#[derive(Clone)]
pub struct SessionService {
    store: SessionSqlStore,
    codes: InviteCodeGenerator,
    characters: Arc<dyn CharacterDirectory>,
    policy: SessionPolicy,
}

impl SessionService {
    /// Create a service with the default code generator and policy
    pub fn new(store: SessionSqlStore, characters: Arc<dyn CharacterDirectory>) -> Self {
        Self {
            store,
            codes: InviteCodeGenerator::default(),
            characters,
            policy: SessionPolicy::default(),
        }
    }

    /// Open the configured database and apply the invite and policy sections
    pub fn from_config(
        config: &Config,
        characters: Arc<dyn CharacterDirectory>,
    ) -> SessionResult<Self> {
        let store = SessionSqlStore::open(&config.store)?;
        Ok(Self::new(store, characters)
            .with_code_generator(config.invites.generator()?)
            .with_policy(config.policy))
    }

    pub fn with_code_generator(mut self, codes: InviteCodeGenerator) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &SessionSqlStore {
        &self.store
    }

    /// Trim, upper-case and reject empty invite codes
    fn normalize_code(code: &str) -> SessionResult<String> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(SessionError::Validation("invite code must not be empty".into()));
        }
        Ok(code)
    }

    fn require_member(
        members: &MembershipStore<'_>,
        session_id: &SessionId,
        user: &UserId,
        action: &str,
    ) -> SessionResult<Session> {
        let session = members.require_session(session_id)?;
        if !members.is_member(session_id, user)? {
            return Err(SessionError::permission(user, action));
        }
        Ok(session)
    }

    fn require_master(
        members: &MembershipStore<'_>,
        session_id: &SessionId,
        user: &UserId,
        action: &str,
    ) -> SessionResult<Session> {
        let session = members.require_session(session_id)?;
        if !session.is_master(user) {
            return Err(SessionError::permission(user, action));
        }
        Ok(session)
    }
}

impl SessionManager for SessionService {
    fn create_session(
        &self,
        user: &UserId,
        name: &str,
        description: Option<String>,
    ) -> SessionResult<Session> {
        let name = Session::validate_name(name)?;
        let description = description.filter(|d| !d.trim().is_empty());
        let session = Session::new(user.clone(), name, description);

        self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            members.insert_session(&session)?;
            members.ensure_master(&session.id, user)?;
            Ok(())
        })?;

        record_counter(session_metrics::SESSION_CREATED, 1);
        info!(session_id = %session.id, master = %user, "session created");
        Ok(session)
    }

    fn get_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<Session> {
        self.store.with_transaction(|tx| {
            Self::require_member(&MembershipStore::new(tx), session_id, user, "view this session")
        })
    }

    fn list_sessions(&self, user: &UserId) -> SessionResult<Vec<Session>> {
        self.store
            .with_transaction(|tx| MembershipStore::new(tx).list_sessions_for_user(user))
    }

    fn list_members(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> SessionResult<Vec<SessionMember>> {
        self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            Self::require_member(&members, session_id, user, "list members of this session")?;
            members.list_members(session_id)
        })
    }

    fn archive_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<Session> {
        let session = self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            let session = Self::require_master(&members, session_id, user, "archive this session")?;
            if session.is_archived() {
                return Err(SessionError::InvalidOperation("session is already archived".into()));
            }
            members.set_status(session_id, SessionStatus::Archived, Timestamp::now())?;
            members.require_session(session_id)
        })?;

        record_counter(session_metrics::SESSION_ARCHIVED, 1);
        info!(session_id = %session_id, "session archived");
        Ok(session)
    }

    fn remove_member(
        &self,
        actor: &UserId,
        session_id: &SessionId,
        target: &UserId,
    ) -> SessionResult<()> {
        self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            let session = members.require_session(session_id)?;
            if actor != target && !session.is_master(actor) {
                return Err(SessionError::permission(actor, "remove other members"));
            }
            members.remove_member(&session, target)?;
            if SessionCharacterStore::new(tx).clear(session_id, target)? {
                debug!(session_id = %session_id, user = %target, "character binding cleared");
            }
            Ok(())
        })?;

        record_counter(session_metrics::MEMBER_REMOVED, 1);
        info!(session_id = %session_id, actor = %actor, user = %target, "member removed");
        Ok(())
    }

    fn delete_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<()> {
        self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            Self::require_master(&members, session_id, user, "delete this session")?;
            members.delete_session(session_id)
        })?;

        info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    fn select_character(
        &self,
        user: &UserId,
        session_id: &SessionId,
        character_id: &CharacterId,
    ) -> SessionResult<(SessionCharacter, SelectionAction)> {
        let (selection, action) = self.store.with_transaction(|tx| {
            let members = MembershipStore::new(tx);
            Self::require_member(&members, session_id, user, "select a character here")?;

            if self.characters.get_character(character_id, user)?.is_none() {
                return Err(SessionError::not_found("Character", character_id));
            }

            SessionCharacterStore::new(tx).upsert(session_id, user, character_id, Timestamp::now())
        })?;

        record_counter(session_metrics::CHARACTER_SELECTED, 1);
        info!(
            session_id = %session_id,
            user = %user,
            character_id = %character_id,
            ?action,
            "character selected"
        );
        Ok((selection, action))
    }
}

impl InviteManager for SessionService {
    fn create_invite(
        &self,
        user: &UserId,
        session_id: &SessionId,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> SessionResult<SessionInvite> {
        let invite = self.store.with_transaction(|tx| {
            let session = MembershipStore::new(tx).require_session(session_id)?;
            if !session.is_master(user) {
                return Err(SessionError::permission(user, "create invites for this session"));
            }
            if session.is_archived() {
                return Err(SessionError::InvalidOperation(
                    "cannot create invites for an archived session".into(),
                ));
            }
            InviteStore::new(tx).create(&self.codes, &session, user, max_uses, expires_at)
        })?;

        record_counter(session_metrics::INVITE_CREATED, 1);
        info!(session_id = %session_id, code = %invite.code, ?max_uses, "invite created");
        Ok(invite)
    }

    fn join_by_code(&self, user: &UserId, code: &str) -> SessionResult<Session> {
        let code = Self::normalize_code(code)?;
        let now = Timestamp::now();

        let result = self.store.with_transaction(|tx| {
            let invites = InviteStore::new(tx);
            let members = MembershipStore::new(tx);

            let invite =
                invites.get(&code)?.ok_or_else(|| SessionError::not_found("Invite", &code))?;
            let already_member = members.is_member(&invite.session_id, user)?;

            if already_member && !self.policy.count_repeat_joins {
                if let Some(reason) = invite.rejection_at(now) {
                    return Err(SessionError::InvalidInvite {
                        code: code.clone(),
                        reason,
                    });
                }
            } else {
                invites.redeem(&code, now)?;
            }

            let session = members.require_session(&invite.session_id)?;
            if session.is_archived() && !self.policy.archived_sessions_accept_joins {
                return Err(SessionError::InvalidOperation(
                    "session is archived and no longer accepts players".into(),
                ));
            }

            members.add_member(&session.id, user, SessionRole::Player)?;
            Ok((session, already_member))
        });

        match result {
            Ok((session, already_member)) => {
                record_counter(session_metrics::INVITE_REDEEMED, 1);
                info!(
                    session_id = %session.id,
                    user = %user,
                    code = %code,
                    already_member,
                    "joined session by invite"
                );
                Ok(session)
            }
            Err(e @ SessionError::InvalidInvite { .. }) => {
                record_counter(session_metrics::INVITE_REJECTED, 1);
                warn!(user = %user, code = %code, error = %e, "join rejected");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn get_invite(&self, code: &str) -> SessionResult<SessionInvite> {
        let code = Self::normalize_code(code)?;
        self.store.with_transaction(|tx| {
            InviteStore::new(tx).get(&code)?.ok_or_else(|| SessionError::not_found("Invite", &code))
        })
    }

    fn list_invites(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> SessionResult<Vec<SessionInvite>> {
        self.store.with_transaction(|tx| {
            Self::require_master(
                &MembershipStore::new(tx),
                session_id,
                user,
                "list invites of this session",
            )?;
            InviteStore::new(tx).list_for_session(session_id)
        })
    }
}
