// src/models/organization.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Tenant boundary: owns projects, taxonomies and memberships.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// UsersInOrganization row. `admin` is scoped to this organization only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub admin: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOrganization {
    pub organization_id: Uuid,
}

impl Organization {
    pub fn new(input: NewOrganization) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
        }
    }
}
