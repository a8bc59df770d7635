// src/models/taxonomy.rs

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// The three organization-scoped classifications a ticket carries.
///
/// Doubles as the `changeType` of a history entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxonomyKind {
    Priority,
    Status,
    Type,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 3] = [TaxonomyKind::Priority, TaxonomyKind::Status, TaxonomyKind::Type];

    /// Key segment used by the store.
    pub fn segment(self) -> &'static str {
        match self {
            TaxonomyKind::Priority => "priority",
            TaxonomyKind::Status => "status",
            TaxonomyKind::Type => "type",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.segment() == segment)
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaxonomyKind::Priority => "Priority",
            TaxonomyKind::Status => "Status",
            TaxonomyKind::Type => "Type",
        };
        f.write_str(label)
    }
}

/// One TicketPriority / TicketStatus / TicketType row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: TaxonomyKind,
    pub value: String,
    pub colour: String,
    pub rank: i32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomyEntry {
    #[validate(length(min = 1, max = 100, message = "Value is required"))]
    pub value: String,
    #[validate(length(min = 1, max = 32, message = "Colour is required"))]
    pub colour: String,
    #[serde(default)]
    pub rank: i32,
}

impl TaxonomyEntry {
    pub fn new(organization_id: Uuid, kind: TaxonomyKind, input: NewTaxonomyEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            kind,
            value: input.value,
            colour: input.colour,
            rank: input.rank,
        }
    }

    /// Listing order: rank ascending (lower is more significant), then label.
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.rank.cmp(&b.rank).then_with(|| a.value.cmp(&b.value))
    }
}
