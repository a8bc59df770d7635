// src/web/users.rs

use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{ApiError, Result};
use crate::middleware::{AppState, OrgSession};
use crate::models::{SwitchOrganization, UserSummary};
use crate::session::Session;
use crate::validation::{PathParams, ValidatedJson};

/// Members of the active organization.
pub async fn list(State(state): State<AppState>, org: OrgSession) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(state.service.organization_users(org.organization_id).await?))
}

/// Switch the active organization. Users may only switch themselves.
pub async fn switch_organization(
    State(state): State<AppState>,
    session: Session,
    PathParams(user_id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<SwitchOrganization>,
) -> Result<Json<Value>> {
    if user_id != session.user_id() {
        warn!(caller = %session.user_id(), target = %user_id, "Attempt to switch another user's organization");
        return Err(ApiError::Forbidden("Users can only change their own settings".to_string()));
    }
    let organization_id = state
        .service
        .switch_organization(session.user_id(), input.organization_id)
        .await?;
    Ok(Json(json!({ "organizationId": organization_id })))
}
