// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

/// Per-user settings blob.
///
/// `organization` is the active tenant; any other key written by a client is
/// kept as-is so that switching organizations never drops it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Public part of a user, embedded in tickets, comments and history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl User {
    pub fn new(email: Option<String>, name: Option<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            image,
            settings: UserSettings::default(),
            created_at: Utc::now(),
        }
    }

    pub fn active_organization(&self) -> Option<Uuid> {
        self.settings.organization
    }

    /// Human readable handle for logs and the CLI.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("<anonymous>")
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}
