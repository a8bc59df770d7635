// src/models/history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{TaxonomyEntry, TaxonomyKind};

/// Label shown when a field was, or becomes, unset.
pub const NIL_VALUE: &str = "Nil";
/// Colour paired with [`NIL_VALUE`].
pub const NIL_COLOUR: &str = "black";

/// Resolved label/colour pair of a classification value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub value: String,
    pub colour: String,
}

impl Label {
    pub fn nil() -> Self {
        Self {
            value: NIL_VALUE.to_string(),
            colour: NIL_COLOUR.to_string(),
        }
    }

    pub fn of(entry: Option<&TaxonomyEntry>) -> Self {
        entry.map(Self::from).unwrap_or_else(Self::nil)
    }
}

impl From<&TaxonomyEntry> for Label {
    fn from(entry: &TaxonomyEntry) -> Self {
        Self {
            value: entry.value.clone(),
            colour: entry.colour.clone(),
        }
    }
}

/// Immutable audit record of one classification change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketHistory {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub change_type: TaxonomyKind,
    pub previous_value: String,
    pub previous_colour: String,
    pub new_value: String,
    pub new_colour: String,
    pub changed_at: DateTime<Utc>,
}
