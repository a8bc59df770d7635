// src/models/views.rs

//! Read models returned by queries: records joined with what the UI shows next to them.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Project, TaxonomyEntry, TeamMember, Ticket, TicketComment, TicketHistory, UserSummary};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub team: Vec<TeamMember>,
}

/// A ticket with its project and resolved classification entries.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub project: Option<Project>,
    pub ticket_priority: Option<TaxonomyEntry>,
    pub ticket_status: Option<TaxonomyEntry>,
    pub ticket_type: Option<TaxonomyEntry>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: TicketComment,
    pub creator: Option<UserSummary>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    #[serde(flatten)]
    pub entry: TicketHistory,
    pub user: Option<UserSummary>,
}

/// Everything the ticket page needs. Comments and history are newest first.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    #[serde(flatten)]
    pub summary: TicketSummary,
    pub creator: Option<UserSummary>,
    pub assigned: Option<UserSummary>,
    pub comments: Vec<CommentView>,
    pub history: Vec<HistoryView>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChartSlice {
    pub key: String,
    pub colour: String,
    pub value: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBreakdown {
    pub project_id: Uuid,
    pub project: String,
    pub priority: Vec<ChartSlice>,
    pub status: Vec<ChartSlice>,
    #[serde(rename = "type")]
    pub r#type: Vec<ChartSlice>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub active_projects: usize,
    pub important_tickets: usize,
    pub unresolved_tickets: usize,
    pub unassigned_tickets: usize,
    pub projects: Vec<ProjectBreakdown>,
}
