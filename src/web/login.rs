// src/web/login.rs

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{ApiError, Result};
use crate::middleware::AppState;
use crate::session::{IdentityProfile, Session, SessionView};
use crate::validation::ValidatedJson;

/// Header carrying the shared secret of the identity callback.
pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub token: String,
    pub user_id: Uuid,
    pub expires_in: u64,
}

/// Completes a sign-in relayed by the identity provider's trusted upstream.
///
/// The secret is checked before the body is looked at.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<ValidatedJson<IdentityProfile>, ApiError>,
) -> Result<Json<CallbackResponse>> {
    let Some(expected) = state.identity_secret.as_deref() else {
        return Err(ApiError::NotFound("Identity callback is not configured".to_string()));
    };
    let provided = headers.get(IDENTITY_SECRET_HEADER).and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        warn!("Identity callback with a wrong secret");
        return Err(ApiError::Unauthorized);
    }

    let ValidatedJson(profile) = body?;
    let user = state.service.sign_in(profile).await?;
    let issued = state.tokens.issue(user.id)?;

    info!(user_id = %user.id, "Signed in");
    Ok(Json(CallbackResponse {
        token: issued.token,
        user_id: user.id,
        expires_in: issued.expires_in,
    }))
}

pub async fn session(session: Session) -> Json<SessionView> {
    Json(session.view())
}
