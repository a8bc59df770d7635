// src/web/dashboard.rs

use axum::{extract::State, Json};

use crate::errors::Result;
use crate::middleware::{AppState, OrgSession};
use crate::models::Dashboard;

pub async fn get(State(state): State<AppState>, org: OrgSession) -> Result<Json<Dashboard>> {
    let dashboard = state
        .service
        .dashboard(org.organization_id, org.user_id(), org.is_admin())
        .await?;
    Ok(Json(dashboard))
}
