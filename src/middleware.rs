// src/middleware.rs

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::errors::ApiError;
use crate::session::Session;
use crate::tracker_service::TrackerService;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrackerService>,
    pub tokens: Arc<TokenIssuer>,
    /// Secret expected from the identity callback. `None` disables the callback.
    pub identity_secret: Option<String>,
}

impl AppState {
    pub fn new(service: TrackerService, tokens: TokenIssuer, identity_secret: Option<String>) -> Self {
        Self {
            service: Arc::new(service),
            tokens: Arc::new(tokens),
            identity_secret,
        }
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticated guard: a valid bearer token for a user that still exists.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer(parts) else {
            warn!(path = %parts.uri.path(), "Request without bearer token");
            return Err(ApiError::Unauthorized);
        };

        let user_id = state
            .tokens
            .verify(token)
            .and_then(|claims| claims.user_id())
            .map_err(|e| {
                warn!(path = %parts.uri.path(), error = %e, "Rejected bearer token");
                ApiError::Unauthorized
            })?;

        match Session::materialize(&state.service, user_id).await? {
            Some(session) => Ok(session),
            None => {
                warn!(user_id = %user_id, "Token for unknown user");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Organization guard: an authenticated session with an active organization.
#[derive(Debug, Clone)]
pub struct OrgSession {
    pub session: Session,
    pub organization_id: Uuid,
}

impl OrgSession {
    pub fn from_session(session: Session) -> Result<Self, ApiError> {
        match session.require_organization() {
            Ok(organization_id) => Ok(Self {
                session,
                organization_id,
            }),
            Err(e) => {
                warn!(user_id = %session.user_id(), "No active organization");
                Err(e.into())
            }
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.session.user_id()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OrgSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Self::from_session(session)
    }
}

/// Resource-role guard, logged the same way as the extractors.
pub async fn require_project_manager(state: &AppState, session: &Session, project_id: Uuid) -> Result<(), ApiError> {
    state
        .service
        .authorize_project_manager(project_id, session.user_id())
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!(user_id = %session.user_id(), project_id = %project_id, error = %e, "Project role check failed");
            e.into()
        })
}
