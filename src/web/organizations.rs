// src/web/organizations.rs

use axum::{extract::State, http::StatusCode, Json};

use crate::errors::Result;
use crate::middleware::AppState;
use crate::models::{NewOrganization, Organization};
use crate::session::Session;
use crate::validation::ValidatedJson;

/// Organizations the caller belongs to.
pub async fn list(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Organization>>> {
    Ok(Json(state.service.user_organizations(session.user_id()).await?))
}

/// New organization, owned and administered by the caller, who switches into it.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(input): ValidatedJson<NewOrganization>,
) -> Result<(StatusCode, Json<Organization>)> {
    let organization = state.service.create_organization(session.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}
