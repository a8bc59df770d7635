// src/web/tickets.rs

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, MethodRouter},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::ArchivedFilter;
use crate::errors::Result;
use crate::middleware::{AppState, OrgSession};
use crate::models::{NewComment, NewTaxonomyEntry, NewTicket, TaxonomyEntry, TaxonomyKind, Ticket, TicketComment, TicketDetail, TicketSummary, TicketUpdate};
use crate::session::Session;
use crate::validation::{PathParams, QueryParams, ValidatedJson};

pub async fn list(
    State(state): State<AppState>,
    org: OrgSession,
    QueryParams(filter): QueryParams<ArchivedFilter>,
) -> Result<Json<Vec<TicketSummary>>> {
    Ok(Json(state.service.organization_tickets(org.organization_id, filter.archived).await?))
}

/// Create a ticket. Answers with the new id.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(input): ValidatedJson<NewTicket>,
) -> Result<(StatusCode, Json<Value>)> {
    let ticket = state.service.create_ticket(session.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": ticket.id }))))
}

pub async fn assigned(State(state): State<AppState>, session: Session) -> Result<Json<Vec<TicketSummary>>> {
    Ok(Json(state.service.assigned_tickets(session.user_id()).await?))
}

pub async fn submitted(State(state): State<AppState>, session: Session) -> Result<Json<Vec<TicketSummary>>> {
    Ok(Json(state.service.submitted_tickets(session.user_id()).await?))
}

pub async fn detail(State(state): State<AppState>, _session: Session, PathParams(id): PathParams<Uuid>) -> Result<Json<TicketDetail>> {
    Ok(Json(state.service.ticket_detail(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<TicketUpdate>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.service.update_ticket(session.user_id(), id, input).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(input): ValidatedJson<NewComment>,
) -> Result<(StatusCode, Json<TicketComment>)> {
    let comment = state.service.add_comment(id, session.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// === TAXONOMY ===

/// GET lists, POST adds, entries of one kind in the active organization.
pub fn taxonomy_routes(kind: TaxonomyKind) -> MethodRouter<AppState> {
    get(move |State(state): State<AppState>, org: OrgSession| list_taxonomy(state, org, kind)).post(
        move |State(state): State<AppState>, org: OrgSession, ValidatedJson(input): ValidatedJson<NewTaxonomyEntry>| {
            add_taxonomy(state, org, kind, input)
        },
    )
}

async fn list_taxonomy(state: AppState, org: OrgSession, kind: TaxonomyKind) -> Result<Json<Vec<TaxonomyEntry>>> {
    Ok(Json(state.service.taxonomy(org.organization_id, kind).await?))
}

async fn add_taxonomy(
    state: AppState,
    org: OrgSession,
    kind: TaxonomyKind,
    input: NewTaxonomyEntry,
) -> Result<(StatusCode, Json<TaxonomyEntry>)> {
    let entry = state.service.create_taxonomy_entry(org.organization_id, kind, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
