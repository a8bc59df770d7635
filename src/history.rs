// src/history.rs

//! Ticket field-change history.
//!
//! Change detection is pure: a [`Classification`] holds the three taxonomy ids
//! of a ticket, and comparing the stored one with the incoming one yields at
//! most one [`FieldChange`] per field. Resolving ids to labels needs the store
//! and lives in `TrackerService`; [`record`] turns a resolved change into the
//! immutable [`TicketHistory`] row.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Label, NewTicket, TaxonomyKind, Ticket, TicketHistory, TicketUpdate};

/// Priority/status/type ids of a ticket, indexed by [`TaxonomyKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification([Option<Uuid>; 3]);

/// One classification field whose id differs between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChange {
    pub kind: TaxonomyKind,
    pub previous: Option<Uuid>,
    pub next: Option<Uuid>,
}

impl Classification {
    pub fn new(priority: Option<Uuid>, status: Option<Uuid>, r#type: Option<Uuid>) -> Self {
        Self([priority, status, r#type])
    }

    pub fn get(&self, kind: TaxonomyKind) -> Option<Uuid> {
        self.0[kind as usize]
    }

    /// Fields that differ from `current`, in priority/status/type order.
    ///
    /// `None == None` is not a change.
    pub fn changes_from(&self, current: &Classification) -> Vec<FieldChange> {
        TaxonomyKind::ALL
            .into_iter()
            .filter(|&kind| self.get(kind) != current.get(kind))
            .map(|kind| FieldChange {
                kind,
                previous: current.get(kind),
                next: self.get(kind),
            })
            .collect()
    }

    /// Changes recorded when a ticket is created with this classification.
    pub fn initial_changes(&self) -> Vec<FieldChange> {
        self.changes_from(&Classification::default())
    }
}

impl From<&Ticket> for Classification {
    fn from(ticket: &Ticket) -> Self {
        Self::new(ticket.ticket_priority_id, ticket.ticket_status_id, ticket.ticket_type_id)
    }
}

impl From<&NewTicket> for Classification {
    fn from(input: &NewTicket) -> Self {
        Self::new(input.ticket_priority_id, input.ticket_status_id, input.ticket_type_id)
    }
}

impl From<&TicketUpdate> for Classification {
    fn from(input: &TicketUpdate) -> Self {
        Self::new(input.ticket_priority_id, input.ticket_status_id, input.ticket_type_id)
    }
}

/// Build the history row for one resolved change.
pub fn record(
    ticket_id: Uuid,
    user_id: Uuid,
    kind: TaxonomyKind,
    previous: Label,
    next: Label,
    changed_at: DateTime<Utc>,
) -> TicketHistory {
    TicketHistory {
        id: Uuid::new_v4(),
        ticket_id,
        user_id,
        change_type: kind,
        previous_value: previous.value,
        previous_colour: previous.colour,
        new_value: next.value,
        new_colour: next.colour,
        changed_at,
    }
}
