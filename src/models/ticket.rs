// src/models/ticket.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::TaxonomyKind;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived: bool,
    pub creator_id: Uuid,
    pub assigned_id: Option<Uuid>,
    pub ticket_priority_id: Option<Uuid>,
    pub ticket_status_id: Option<Uuid>,
    pub ticket_type_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub creator_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub project_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub assigned_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_priority_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_status_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_type_id: Option<Uuid>,
}

/// Full replacement of a ticket's mutable fields.
///
/// An absent classification id means "unset", so omitting
/// `ticketPriorityId` on a ticket that has one clears it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub assigned_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_priority_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_status_id: Option<Uuid>,
    #[serde(default)]
    pub ticket_type_id: Option<Uuid>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[validate(length(min = 1, max = 10_000, message = "Comment is required"))]
    pub comment: String,
}

impl Ticket {
    pub fn new(creator_id: Uuid, input: NewTicket) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            title: input.title,
            description: input.description,
            created_at: now,
            updated_at: now,
            archived: input.archived,
            creator_id,
            assigned_id: input.assigned_id,
            ticket_priority_id: input.ticket_priority_id,
            ticket_status_id: input.ticket_status_id,
            ticket_type_id: input.ticket_type_id,
        }
    }

    /// The stored taxonomy id for one classification field.
    pub fn classification(&self, kind: TaxonomyKind) -> Option<Uuid> {
        match kind {
            TaxonomyKind::Priority => self.ticket_priority_id,
            TaxonomyKind::Status => self.ticket_status_id,
            TaxonomyKind::Type => self.ticket_type_id,
        }
    }

    pub fn apply(&mut self, update: TicketUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        self.description = update.description;
        self.archived = update.archived;
        self.assigned_id = update.assigned_id;
        self.ticket_priority_id = update.ticket_priority_id;
        self.ticket_status_id = update.ticket_status_id;
        self.ticket_type_id = update.ticket_type_id;
        self.updated_at = Utc::now();
    }
}

impl TicketComment {
    pub fn new(ticket_id: Uuid, creator_id: Uuid, input: NewComment) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            creator_id,
            comment: input.comment,
            created_at: Utc::now(),
        }
    }
}
