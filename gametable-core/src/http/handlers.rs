//! HTTP API handlers
//!
//! Store work is synchronous, so every handler hands the service call to
//! tokio's blocking pool.

use super::state::AppState;
use super::types::*;
use crate::core_session::{
    CharacterId, InviteManager, InviteRejection, SessionError, SessionId, SessionManager,
    SessionResult, SessionService, Timestamp, UserId,
};
use crate::metrics::{Timer, HTTP_REQUEST_DURATION};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error};

/// Header carrying the authenticated caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Error type for API responses
#[derive(Debug)]
pub enum ApiError {
    /// No caller identity on the request
    Unauthenticated,
    Session(SessionError),
    /// The blocking task panicked or was cancelled
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Session(err) => match err {
                SessionError::Validation(_) => StatusCode::BAD_REQUEST,
                SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
                SessionError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                SessionError::InvalidInvite {
                    reason: InviteRejection::Expired | InviteRejection::Exhausted,
                    ..
                } => StatusCode::GONE,
                SessionError::InvalidOperation(_) => StatusCode::CONFLICT,
                SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Internal(_) => "internal_error",
            ApiError::Session(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unauthenticated => format!("missing {} header", USER_ID_HEADER),
            ApiError::Session(err) => err.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        };

        if status.is_server_error() {
            error!(code = self.code(), %message, "request failed");
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Caller identity taken from the `x-user-id` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| AuthenticatedUser(UserId::from(value)))
            .ok_or(ApiError::Unauthenticated)
    }
}

/// JSON body whose rejections surface as `validation_error`
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "rejected request body");
                Err(ApiError::Session(SessionError::Validation(rejection.body_text())))
            }
        }
    }
}

/// Run a service call on the blocking pool and time it under `route`
async fn run_blocking<T, F>(state: &AppState, route: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce(&SessionService) -> SessionResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let timer = Timer::new(HTTP_REQUEST_DURATION, route);
    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))?;
    timer.stop();
    Ok(result?)
}

// ============================================================================
// Session Handlers
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /sessions - Create a session owned by the caller
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<SessionCreateRequest>,
) -> ApiResult<(StatusCode, Json<SessionCreateResponse>)> {
    let session = run_blocking(&state, "POST /sessions", move |service| {
        service.create_session(&user, &req.name, req.description)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(SessionCreateResponse::from(&session))))
}

/// GET /sessions - Sessions the caller belongs to
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<SessionListResponse>> {
    let sessions =
        run_blocking(&state, "GET /sessions", move |service| service.list_sessions(&user)).await?;

    Ok(Json(SessionListResponse {
        sessions: sessions.iter().map(SessionSummary::from).collect(),
    }))
}

/// GET /sessions/:id - Session details with members
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionDetailResponse>> {
    let session_id = SessionId::new(session_id);
    let (session, members) = run_blocking(&state, "GET /sessions/:id", move |service| {
        let session = service.get_session(&user, &session_id)?;
        let members = service.list_members(&user, &session_id)?;
        Ok((session, members))
    })
    .await?;

    Ok(Json(SessionDetailResponse {
        session: SessionSummary::from(&session),
        members: members.iter().map(MemberInfo::from).collect(),
    }))
}

/// POST /sessions/:id/archive - Archive a session (master only)
pub async fn archive_session(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSummary>> {
    let session_id = SessionId::new(session_id);
    let session = run_blocking(&state, "POST /sessions/:id/archive", move |service| {
        service.archive_session(&user, &session_id)
    })
    .await?;

    Ok(Json(SessionSummary::from(&session)))
}

/// DELETE /sessions/:id - Delete a session (master only)
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let session_id = SessionId::new(session_id);
    run_blocking(&state, "DELETE /sessions/:id", move |service| {
        service.delete_session(&user, &session_id)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sessions/:id/members/:user_id - Kick a member, or leave
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((session_id, target)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let session_id = SessionId::new(session_id);
    let target = UserId::new(target);
    run_blocking(&state, "DELETE /sessions/:id/members/:user_id", move |service| {
        service.remove_member(&actor, &session_id, &target)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Invite Handlers
// ============================================================================

/// POST /sessions/:id/invites - Mint an invite (master only)
pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
    ValidatedJson(req): ValidatedJson<InviteCreateRequest>,
) -> ApiResult<(StatusCode, Json<InviteResponse>)> {
    let session_id = SessionId::new(session_id);
    let expires_at = req.expires_at.map(Timestamp::from_millis);
    let invite = run_blocking(&state, "POST /sessions/:id/invites", move |service| {
        service.create_invite(&user, &session_id, req.max_uses, expires_at)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::at(&invite, Timestamp::now()))))
}

/// GET /sessions/:id/invites - Invites of a session (master only)
pub async fn list_invites(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<InviteListResponse>> {
    let session_id = SessionId::new(session_id);
    let invites = run_blocking(&state, "GET /sessions/:id/invites", move |service| {
        service.list_invites(&user, &session_id)
    })
    .await?;

    let now = Timestamp::now();
    Ok(Json(InviteListResponse {
        invites: invites.iter().map(|invite| InviteResponse::at(invite, now)).collect(),
    }))
}

/// GET /invites/:code - Invite status without redeeming it
pub async fn get_invite(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(code): Path<String>,
) -> ApiResult<Json<InviteResponse>> {
    let invite =
        run_blocking(&state, "GET /invites/:code", move |service| service.get_invite(&code))
            .await?;

    Ok(Json(InviteResponse::at(&invite, Timestamp::now())))
}

/// POST /join - Redeem an invite code
pub async fn join(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<JoinRequest>,
) -> ApiResult<Json<JoinResponse>> {
    let code = req.code.unwrap_or_default();
    let session =
        run_blocking(&state, "POST /join", move |service| service.join_by_code(&user, &code))
            .await?;

    Ok(Json(JoinResponse {
        session_id: session.id.to_string(),
        session_name: session.name,
    }))
}

// ============================================================================
// Character Handlers
// ============================================================================

/// POST /characters/select - Set the caller's character in a session
pub async fn select_character(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<SelectCharacterRequest>,
) -> ApiResult<Json<SelectCharacterResponse>> {
    let session_id = SessionId::new(req.session_id);
    let character_id = CharacterId::new(req.character_id);
    let (selection, action) = run_blocking(&state, "POST /characters/select", move |service| {
        service.select_character(&user, &session_id, &character_id)
    })
    .await?;

    Ok(Json(SelectCharacterResponse::new(&selection, action)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (SessionError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (SessionError::not_found("Session", "s1"), StatusCode::NOT_FOUND),
            (SessionError::permission("bob", "archive"), StatusCode::FORBIDDEN),
            (
                SessionError::InvalidInvite {
                    code: "A".into(),
                    reason: InviteRejection::Expired,
                },
                StatusCode::GONE,
            ),
            (SessionError::InvalidOperation("x".into()), StatusCode::CONFLICT),
            (SessionError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthenticated.code(), "unauthenticated");
    }
}
