// src/session.rs

//! Identity and session resolution.
//!
//! A token only carries the user id. Everything else a guard looks at (active
//! organization, admin flag, manager flag) is re-read from the store every
//! time a session is materialized, so role changes apply on the next request.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{User, UserSettings};
use crate::tracker_service::{TrackerError, TrackerService};

bitflags! {
    /// Roles derived from membership tables at session build time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Roles: u8 {
        /// Admin of the active organization.
        const ADMIN           = 0b0000_0001;
        /// Manager of at least one project.
        const PROJECT_MANAGER = 0b0000_0010;
    }
}

/// Verified profile handed over by the identity provider.
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct IdentityProfile {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub roles: Roles,
}

/// What the client sees of its own session.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub settings: UserSettings,
    pub admin: bool,
    pub pm: bool,
}

impl Session {
    /// Build the session for `user_id`. `None` if the user no longer exists.
    pub async fn materialize(service: &TrackerService, user_id: Uuid) -> Result<Option<Self>, TrackerError> {
        let Some(user) = service.get_user(user_id).await? else {
            return Ok(None);
        };

        let mut roles = Roles::empty();
        if let Some(organization_id) = user.active_organization() {
            let admin = service
                .membership(organization_id, user.id)
                .await?
                .is_some_and(|m| m.admin);
            roles.set(Roles::ADMIN, admin);
        }
        roles.set(Roles::PROJECT_MANAGER, service.is_manager_anywhere(user.id).await?);

        Ok(Some(Self { user, roles }))
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn active_organization(&self) -> Option<Uuid> {
        self.user.active_organization()
    }

    /// Organization guard: the active organization, or `OrganizationRequired`.
    pub fn require_organization(&self) -> Result<Uuid, TrackerError> {
        self.active_organization().ok_or(TrackerError::OrganizationRequired)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(Roles::ADMIN)
    }

    pub fn is_project_manager(&self) -> bool {
        self.roles.contains(Roles::PROJECT_MANAGER)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.user.id,
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            image: self.user.image.clone(),
            settings: self.user.settings.clone(),
            admin: self.is_admin(),
            pm: self.is_project_manager(),
        }
    }
}
