//! Game sessions, invites and membership
//!
//! ## Model
//!
//! - **Session**: a game table owned by its master
//! - **SessionMember**: one row per (session, user) with a `Master` or `Player` role
//! - **SessionInvite**: shareable code with optional usage cap and expiry
//! - **SessionCharacter**: the character a member plays in a session
//!
//! ## Guarantees
//!
//! 1. Creating a session and its master membership is a single transaction
//! 2. Redeeming an invite increments `uses_count` with a conditional update,
//!    so `uses_count <= max_uses` holds under concurrent joins
//! 3. Redemption and membership creation commit or roll back together

pub mod character;
pub mod code;
pub mod errors;
pub mod invite;
pub mod manager;
pub mod manager_impl;
pub mod policy;
pub mod session;
pub mod storage;
pub mod types;

pub use character::{
    CharacterDirectory, CharacterRef, InMemoryCharacterDirectory, SelectionAction,
    SessionCharacter,
};
pub use code::InviteCodeGenerator;
pub use errors::{InviteRejection, SessionError, SessionResult};
pub use invite::{InviteStatus, SessionInvite};
pub use manager::{InviteManager, SessionManager};
pub use manager_impl::SessionService;
pub use policy::SessionPolicy;
pub use session::{Session, SessionMember, SessionRole, SessionStatus};
pub use storage::SessionSqlStore;
pub use types::{CharacterId, InviteId, MemberId, SessionCharacterId, SessionId, Timestamp, UserId};
