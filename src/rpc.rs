// src/rpc.rs

//! Procedure-call surface: `/api/trpc/:procedure`.
//!
//! Queries are called with GET and a URL encoded `?input=<json>`, mutations
//! with POST and a JSON body. Results are wrapped as `{"result":{"data":..}}`
//! and failures as `{"error":{"code","message","httpStatus"}}`.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ApiError, Issue};
use crate::middleware::{require_project_manager, AppState, OrgSession};
use crate::models::{
    NewComment, NewOrganization, NewProject, NewTaxonomyEntry, NewTicket, ProjectUpdate, SwitchOrganization,
    TaxonomyKind, TicketUpdate,
};
use crate::session::Session;
use crate::validation::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

/// Every procedure and whether it is a query or a mutation.
pub const PROCEDURES: &[(&str, ProcedureKind)] = &[
    ("organization.add", ProcedureKind::Mutation),
    ("organization.change", ProcedureKind::Mutation),
    ("organization.getAll", ProcedureKind::Query),
    ("project.add", ProcedureKind::Mutation),
    ("project.get", ProcedureKind::Query),
    ("project.getAll", ProcedureKind::Query),
    ("project.getUserProjects", ProcedureKind::Query),
    ("project.update", ProcedureKind::Mutation),
    ("project.addUser", ProcedureKind::Mutation),
    ("project.removeUser", ProcedureKind::Mutation),
    ("project.getUsers", ProcedureKind::Query),
    ("ticket.add", ProcedureKind::Mutation),
    ("ticket.get", ProcedureKind::Query),
    ("ticket.getAll", ProcedureKind::Query),
    ("ticket.update", ProcedureKind::Mutation),
    ("ticket.getUserAssignedTickets", ProcedureKind::Query),
    ("ticket.getUserSubmittedTickets", ProcedureKind::Query),
    ("ticket.comment.add", ProcedureKind::Mutation),
    ("ticket.priority.add", ProcedureKind::Mutation),
    ("ticket.priority.getAll", ProcedureKind::Query),
    ("ticket.status.add", ProcedureKind::Mutation),
    ("ticket.status.getAll", ProcedureKind::Query),
    ("ticket.type.add", ProcedureKind::Mutation),
    ("ticket.type.getAll", ProcedureKind::Query),
    ("user.getAll", ProcedureKind::Query),
    ("user.me", ProcedureKind::Query),
    ("dashboard.get", ProcedureKind::Query),
];

pub fn procedure_kind(name: &str) -> Option<ProcedureKind> {
    PROCEDURES.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
}

// === INPUTS ===

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
struct IdInput {
    id: Uuid,
}

#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase")]
struct ArchivedInput {
    #[serde(default)]
    archived: Option<bool>,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
struct MemberInput {
    id: Uuid,
    user: Uuid,
    #[serde(default)]
    manager: bool,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
struct CommentInput {
    ticket_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    comment: NewComment,
}

#[derive(Deserialize)]
pub struct RpcQuery {
    pub input: Option<String>,
}

/// Decode and validate a procedure input. A missing input reads as `{}`.
fn parse<T: DeserializeOwned + Validate>(input: &Value) -> Result<T, ApiError> {
    let value = if input.is_null() { json!({}) } else { input.clone() };
    let parsed: T = serde_json::from_value(value).map_err(|e| {
        ApiError::ValidationFailed(vec![Issue {
            path: String::new(),
            code: "invalid_input".to_string(),
            message: e.to_string(),
        }])
    })?;
    validate(parsed)
}

fn data<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn taxonomy_kind(segment: &str) -> Option<TaxonomyKind> {
    TaxonomyKind::from_segment(segment)
}

// === HANDLERS ===

pub async fn query(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    Query(params): Query<RpcQuery>,
    session: Result<Session, ApiError>,
) -> Response {
    let input = match params.input.as_deref().map(serde_json::from_str::<Value>) {
        None => Ok(Value::Null),
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ApiError::ValidationFailed(vec![Issue {
            path: String::new(),
            code: "invalid_input".to_string(),
            message: e.to_string(),
        }])),
    };
    respond(&state, &procedure, ProcedureKind::Query, session, input).await
}

pub async fn mutation(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    session: Result<Session, ApiError>,
    body: Bytes,
) -> Response {
    let input = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|e| {
            ApiError::ValidationFailed(vec![Issue {
                path: String::new(),
                code: "invalid_input".to_string(),
                message: e.to_string(),
            }])
        })
    };
    respond(&state, &procedure, ProcedureKind::Mutation, session, input).await
}

async fn respond(
    state: &AppState,
    procedure: &str,
    method: ProcedureKind,
    session: Result<Session, ApiError>,
    input: Result<Value, ApiError>,
) -> Response {
    match dispatch(state, procedure, method, session, input).await {
        Ok(value) => Json(json!({ "result": { "data": value } })).into_response(),
        Err(e) => e.into_rpc_response(),
    }
}

/// Resolve the procedure first, then authenticate, then decode the input.
async fn dispatch(
    state: &AppState,
    procedure: &str,
    method: ProcedureKind,
    session: Result<Session, ApiError>,
    input: Result<Value, ApiError>,
) -> Result<Value, ApiError> {
    match procedure_kind(procedure) {
        None => return Err(ApiError::NotFound(format!("No procedure named {}", procedure))),
        Some(kind) if kind != method => return Err(ApiError::MethodNotAllowed),
        Some(_) => {}
    }
    let session = session?;
    let input = input?;
    debug!(procedure, user_id = %session.user_id(), "Procedure call");
    call(state, session, procedure, &input).await
}

/// Run one procedure on behalf of an authenticated session.
pub async fn call(state: &AppState, session: Session, procedure: &str, input: &Value) -> Result<Value, ApiError> {
    let service = &state.service;

    if let Some(rest) = procedure.strip_prefix("ticket.") {
        if let Some((segment, action)) = rest.split_once('.') {
            if let Some(kind) = taxonomy_kind(segment) {
                let org = OrgSession::from_session(session)?;
                return match action {
                    "add" => {
                        let entry: NewTaxonomyEntry = parse(input)?;
                        data(service.create_taxonomy_entry(org.organization_id, kind, entry).await?)
                    }
                    "getAll" => data(service.taxonomy(org.organization_id, kind).await?),
                    _ => Err(ApiError::NotFound(format!("No procedure named {}", procedure))),
                };
            }
        }
    }

    match procedure {
        // organization
        "organization.add" => {
            let input: NewOrganization = parse(input)?;
            let organization = service.create_organization(session.user_id(), input).await?;
            data(organization.id)
        }
        "organization.change" => {
            let input: SwitchOrganization = parse(input)?;
            data(service.switch_organization(session.user_id(), input.organization_id).await?)
        }
        "organization.getAll" => data(service.user_organizations(session.user_id()).await?),

        // project
        "project.add" => {
            let org = OrgSession::from_session(session)?;
            let input: NewProject = parse(input)?;
            data(service.create_project(org.organization_id, input).await?)
        }
        "project.get" => {
            let IdInput { id } = parse(input)?;
            data(service.project_detail(id).await?)
        }
        "project.getAll" => {
            let org = OrgSession::from_session(session)?;
            let ArchivedInput { archived } = parse(input)?;
            data(
                service
                    .organization_projects(org.organization_id, org.user_id(), org.is_admin(), archived)
                    .await?,
            )
        }
        "project.getUserProjects" => data(service.user_projects(session.user_id()).await?),
        "project.update" => {
            let IdInput { id } = parse(input)?;
            let update: ProjectUpdate = parse(input)?;
            require_project_manager(state, &session, id).await?;
            data(service.update_project(id, update).await?)
        }
        "project.addUser" => {
            let MemberInput { id, user, manager } = parse(input)?;
            require_project_manager(state, &session, id).await?;
            data(service.add_project_user(id, user, manager).await?)
        }
        "project.removeUser" => {
            let MemberInput { id, user, .. } = parse(input)?;
            require_project_manager(state, &session, id).await?;
            service.remove_project_user(id, user).await?;
            Ok(Value::Null)
        }
        "project.getUsers" => {
            let IdInput { id } = parse(input)?;
            service.require_project(id).await?;
            data(service.project_team(id).await?)
        }

        // ticket
        "ticket.add" => {
            let input: NewTicket = parse(input)?;
            let ticket = service.create_ticket(session.user_id(), input).await?;
            data(ticket.id)
        }
        "ticket.get" => {
            let IdInput { id } = parse(input)?;
            data(service.ticket_detail(id).await?)
        }
        "ticket.getAll" => {
            let org = OrgSession::from_session(session)?;
            let ArchivedInput { archived } = parse(input)?;
            data(service.organization_tickets(org.organization_id, archived).await?)
        }
        "ticket.update" => {
            let IdInput { id } = parse(input)?;
            let update: TicketUpdate = parse(input)?;
            data(service.update_ticket(session.user_id(), id, update).await?)
        }
        "ticket.getUserAssignedTickets" => data(service.assigned_tickets(session.user_id()).await?),
        "ticket.getUserSubmittedTickets" => data(service.submitted_tickets(session.user_id()).await?),
        "ticket.comment.add" => {
            let CommentInput { ticket_id, comment } = parse(input)?;
            data(service.add_comment(ticket_id, session.user_id(), comment).await?)
        }

        // user
        "user.getAll" => {
            let org = OrgSession::from_session(session)?;
            data(service.organization_users(org.organization_id).await?)
        }
        "user.me" => data(session.view()),

        // dashboard
        "dashboard.get" => {
            let org = OrgSession::from_session(session)?;
            data(service.dashboard(org.organization_id, org.user_id(), org.is_admin()).await?)
        }

        other => Err(ApiError::NotFound(format!("No procedure named {}", other))),
    }
}
