// src/web/projects.rs

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::ArchivedFilter;
use crate::errors::Result;
use crate::middleware::{require_project_manager, AppState, OrgSession};
use crate::models::{NewProject, NewProjectMember, Project, ProjectDetail, ProjectMember, ProjectUpdate, RemoveProjectMember, TeamMember};
use crate::session::Session;
use crate::validation::{PathParams, QueryParams, ValidatedJson};

/// Projects of the active organization visible to the caller.
pub async fn list(
    State(state): State<AppState>,
    org: OrgSession,
    QueryParams(filter): QueryParams<ArchivedFilter>,
) -> Result<Json<Vec<Project>>> {
    let projects = state
        .service
        .organization_projects(org.organization_id, org.user_id(), org.is_admin(), filter.archived)
        .await?;
    Ok(Json(projects))
}

pub async fn create(
    State(state): State<AppState>,
    org: OrgSession,
    ValidatedJson(input): ValidatedJson<NewProject>,
) -> Result<(StatusCode, Json<Project>)> {
    let project = state.service.create_project(org.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn mine(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.service.user_projects(session.user_id()).await?))
}

pub async fn detail(State(state): State<AppState>, _session: Session, PathParams(id): PathParams<Uuid>) -> Result<Json<ProjectDetail>> {
    Ok(Json(state.service.project_detail(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<ProjectUpdate>,
) -> Result<Json<Project>> {
    require_project_manager(&state, &session, id).await?;
    Ok(Json(state.service.update_project(id, input).await?))
}

pub async fn team(State(state): State<AppState>, _session: Session, PathParams(id): PathParams<Uuid>) -> Result<Json<Vec<TeamMember>>> {
    state.service.require_project(id).await?;
    Ok(Json(state.service.project_team(id).await?))
}

pub async fn add_user(
    State(state): State<AppState>,
    session: Session,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<NewProjectMember>,
) -> Result<(StatusCode, Json<ProjectMember>)> {
    require_project_manager(&state, &session, id).await?;
    let member = state.service.add_project_user(id, input.user, input.manager).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_user(
    State(state): State<AppState>,
    session: Session,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<RemoveProjectMember>,
) -> Result<StatusCode> {
    require_project_manager(&state, &session, id).await?;
    state.service.remove_project_user(id, input.user).await?;
    Ok(StatusCode::NO_CONTENT)
}
