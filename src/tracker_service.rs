// src/tracker_service.rs

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::history::{self, Classification};
use crate::models::*;
use crate::raddb::{MasterKey, RadDB, RadDbError, WriteBatch};
use crate::session::IdentityProfile;

/// Repository errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("storage error: {0}")]
    Db(#[from] RadDbError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("an active organization is required")]
    OrganizationRequired,
}

mod keys {
    use crate::models::TaxonomyKind;
    use uuid::Uuid;

    pub fn user(id: Uuid) -> String {
        format!("user:{}", id)
    }

    pub fn email_index(email: &str) -> String {
        format!("email_index:{}", email.to_lowercase())
    }

    pub fn organization(id: Uuid) -> String {
        format!("org:{}", id)
    }

    pub fn membership(organization: Uuid, user: Uuid) -> String {
        format!("org_member:{}:{}", organization, user)
    }

    pub fn project(id: Uuid) -> String {
        format!("project:{}", id)
    }

    pub fn project_member(project: Uuid, user: Uuid) -> String {
        format!("project_member:{}:{}", project, user)
    }

    pub fn project_members(project: Uuid) -> String {
        format!("project_member:{}:", project)
    }

    pub fn taxonomy(kind: TaxonomyKind, id: Uuid) -> String {
        format!("taxonomy:{}:{}", kind.segment(), id)
    }

    pub fn taxonomies(kind: TaxonomyKind) -> String {
        format!("taxonomy:{}:", kind.segment())
    }

    pub fn ticket(id: Uuid) -> String {
        format!("ticket:{}", id)
    }

    pub fn comment(ticket: Uuid, id: Uuid) -> String {
        format!("comment:{}:{}", ticket, id)
    }

    pub fn comments(ticket: Uuid) -> String {
        format!("comment:{}:", ticket)
    }

    pub fn history(ticket: Uuid, id: Uuid) -> String {
        format!("history:{}:{}", ticket, id)
    }

    pub fn histories(ticket: Uuid) -> String {
        format!("history:{}:", ticket)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TrackerError> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(db: &RadDB, key: &str) -> Result<Option<T>, TrackerError> {
    match db.get(key)? {
        Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
        None => Ok(None),
    }
}

/// Read phase of a ticket update: the edited row and the history rows it produces.
///
/// Nothing is written until the plan is handed to
/// [`TrackerService::commit_ticket_update`].
#[derive(Debug, Clone)]
pub struct TicketUpdatePlan {
    ticket: Ticket,
    history: Vec<TicketHistory>,
}

impl TicketUpdatePlan {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn history(&self) -> &[TicketHistory] {
        &self.history
    }
}

/// Repositories and domain operations of the tracker, over one RadDB store.
#[derive(Clone)]
pub struct TrackerService {
    db: Arc<RwLock<RadDB>>,
    switch_requires_membership: bool,
}

impl TrackerService {
    /// Open the service on the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P, key: &MasterKey) -> Result<Self, TrackerError> {
        let db = RadDB::open(path, key)?;
        Ok(Self::from_db(db))
    }

    pub fn in_memory() -> Self {
        Self::from_db(RadDB::in_memory())
    }

    fn from_db(db: RadDB) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
            switch_requires_membership: true,
        }
    }

    /// Whether switching to an organization requires a membership in it.
    pub fn with_switch_membership(mut self, required: bool) -> Self {
        self.switch_requires_membership = required;
        self
    }

    pub async fn flush(&self) -> Result<(), TrackerError> {
        self.db.read().await.flush()?;
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TrackerError> {
        let db = self.db.read().await;
        decode(&db, key)
    }

    async fn list<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, TrackerError> {
        let db = self.db.read().await;
        db.scan_prefix(prefix)?
            .into_iter()
            .map(|(_, data)| serde_json::from_slice(&data).map_err(TrackerError::from))
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), TrackerError> {
        let db = self.db.write().await;
        db.apply(batch)?;
        Ok(())
    }

    // === USER ===

    /// Map a verified identity to a stored user, creating it on first sign-in.
    pub async fn sign_in(&self, profile: IdentityProfile) -> Result<User, TrackerError> {
        let email = profile.email.trim().to_lowercase();
        let db = self.db.write().await;

        if let Some(id) = decode::<Uuid>(&db, &keys::email_index(&email))? {
            if let Some(user) = decode::<User>(&db, &keys::user(id))? {
                return Ok(user);
            }
        }

        let user = User::new(Some(email.clone()), profile.name, profile.image);
        let mut batch = WriteBatch::new();
        batch
            .put(keys::user(user.id), encode(&user)?)
            .put(keys::email_index(&email), encode(&user.id)?);
        db.apply(batch)?;

        info!(user_id = %user.id, email = %email, "User created on first sign-in");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, TrackerError> {
        self.load(&keys::user(id)).await
    }

    pub async fn require_user(&self, id: Uuid) -> Result<User, TrackerError> {
        self.get_user(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("User {}", id)))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TrackerError> {
        let db = self.db.read().await;
        match decode::<Uuid>(&db, &keys::email_index(email.trim()))? {
            Some(id) => decode(&db, &keys::user(id)),
            None => Ok(None),
        }
    }

    pub async fn all_users(&self) -> Result<Vec<User>, TrackerError> {
        let mut users: Vec<User> = self.list("user:").await?;
        users.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        Ok(users)
    }

    /// Members of an organization, by name.
    pub async fn organization_users(&self, organization_id: Uuid) -> Result<Vec<UserSummary>, TrackerError> {
        let members: Vec<Membership> = self.list(&format!("org_member:{}:", organization_id)).await?;
        let mut users = Vec::with_capacity(members.len());
        for member in members {
            if let Some(user) = self.get_user(member.user_id).await? {
                users.push(user);
            }
        }
        users.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        Ok(users.iter().map(UserSummary::from).collect())
    }

    // === ORGANIZATION ===

    /// Create an organization owned by `owner`.
    ///
    /// The organization, the owner's admin membership and the owner's new
    /// active organization are written in one batch.
    pub async fn create_organization(&self, owner_id: Uuid, input: NewOrganization) -> Result<Organization, TrackerError> {
        let db = self.db.write().await;
        let mut owner: User = decode(&db, &keys::user(owner_id))?
            .ok_or_else(|| TrackerError::NotFound(format!("User {}", owner_id)))?;

        let organization = Organization::new(input);
        let membership = Membership {
            organization_id: organization.id,
            user_id: owner_id,
            admin: true,
        };
        owner.settings.organization = Some(organization.id);

        let mut batch = WriteBatch::new();
        batch
            .put(keys::organization(organization.id), encode(&organization)?)
            .put(keys::membership(organization.id, owner_id), encode(&membership)?)
            .put(keys::user(owner_id), encode(&owner)?);
        db.apply(batch)?;

        info!(organization_id = %organization.id, owner = %owner_id, name = %organization.name, "Organization created");
        Ok(organization)
    }

    pub async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, TrackerError> {
        self.load(&keys::organization(id)).await
    }

    pub async fn all_organizations(&self) -> Result<Vec<Organization>, TrackerError> {
        let mut organizations: Vec<Organization> = self.list("org:").await?;
        organizations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organizations)
    }

    /// Organizations `user_id` belongs to, by name.
    pub async fn user_organizations(&self, user_id: Uuid) -> Result<Vec<Organization>, TrackerError> {
        let memberships: Vec<Membership> = self.list("org_member:").await?;
        let mut organizations = Vec::new();
        for membership in memberships.into_iter().filter(|m| m.user_id == user_id) {
            if let Some(organization) = self.get_organization(membership.organization_id).await? {
                organizations.push(organization);
            }
        }
        organizations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organizations)
    }

    pub async fn membership(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, TrackerError> {
        self.load(&keys::membership(organization_id, user_id)).await
    }

    pub async fn add_member(&self, organization_id: Uuid, user_id: Uuid, admin: bool) -> Result<Membership, TrackerError> {
        if self.get_organization(organization_id).await?.is_none() {
            return Err(TrackerError::NotFound(format!("Organization {}", organization_id)));
        }
        self.require_user(user_id).await?;

        let key = keys::membership(organization_id, user_id);
        let db = self.db.write().await;
        if db.contains_key(&key)? {
            return Err(TrackerError::AlreadyExists(format!(
                "Membership of user {} in organization {}",
                user_id, organization_id
            )));
        }
        let membership = Membership {
            organization_id,
            user_id,
            admin,
        };
        let mut batch = WriteBatch::new();
        batch.put(key, encode(&membership)?);
        db.apply(batch)?;

        info!(organization_id = %organization_id, user_id = %user_id, admin, "Member added to organization");
        Ok(membership)
    }

    /// Make `organization_id` the active organization of `user_id`.
    ///
    /// Other settings keys are left untouched.
    pub async fn switch_organization(&self, user_id: Uuid, organization_id: Uuid) -> Result<Uuid, TrackerError> {
        let db = self.db.write().await;
        if !db.contains_key(&keys::organization(organization_id))? {
            return Err(TrackerError::NotFound(format!("Organization {}", organization_id)));
        }
        if self.switch_requires_membership && !db.contains_key(&keys::membership(organization_id, user_id))? {
            return Err(TrackerError::Forbidden(format!(
                "User {} is not a member of organization {}",
                user_id, organization_id
            )));
        }
        let mut user: User = decode(&db, &keys::user(user_id))?
            .ok_or_else(|| TrackerError::NotFound(format!("User {}", user_id)))?;
        user.settings.organization = Some(organization_id);

        let mut batch = WriteBatch::new();
        batch.put(keys::user(user_id), encode(&user)?);
        db.apply(batch)?;

        info!(user_id = %user_id, organization_id = %organization_id, "Active organization switched");
        Ok(organization_id)
    }

    // === PROJECT ===

    pub async fn create_project(&self, organization_id: Uuid, input: NewProject) -> Result<Project, TrackerError> {
        if self.get_organization(organization_id).await?.is_none() {
            return Err(TrackerError::NotFound(format!("Organization {}", organization_id)));
        }
        let project = Project::new(organization_id, input);
        let mut batch = WriteBatch::new();
        batch.put(keys::project(project.id), encode(&project)?);
        self.commit(batch).await?;

        info!(project_id = %project.id, organization_id = %organization_id, name = %project.name, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<Project>, TrackerError> {
        self.load(&keys::project(id)).await
    }

    pub async fn require_project(&self, id: Uuid) -> Result<Project, TrackerError> {
        self.get_project(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("Project {}", id)))
    }

    pub async fn project_team(&self, project_id: Uuid) -> Result<Vec<TeamMember>, TrackerError> {
        let members: Vec<ProjectMember> = self.list(&keys::project_members(project_id)).await?;
        let mut team = Vec::with_capacity(members.len());
        for member in members {
            if let Some(user) = self.get_user(member.user_id).await? {
                team.push(TeamMember {
                    user: UserSummary::from(&user),
                    manager: member.manager,
                });
            }
        }
        Ok(team)
    }

    pub async fn project_detail(&self, id: Uuid) -> Result<ProjectDetail, TrackerError> {
        let project = self.require_project(id).await?;
        let team = self.project_team(id).await?;
        Ok(ProjectDetail { project, team })
    }

    /// Projects of an organization visible to a user: all of them for an
    /// admin, otherwise those whose team includes the user.
    async fn visible_projects(&self, organization_id: Uuid, user_id: Uuid, admin: bool) -> Result<Vec<Project>, TrackerError> {
        let mut projects: Vec<Project> = self
            .list::<Project>("project:")
            .await?
            .into_iter()
            .filter(|p| p.organization_id == organization_id)
            .collect();

        if !admin {
            let db = self.db.read().await;
            let mut mine = Vec::with_capacity(projects.len());
            for project in projects {
                if db.contains_key(&keys::project_member(project.id, user_id))? {
                    mine.push(project);
                }
            }
            projects = mine;
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub async fn organization_projects(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        admin: bool,
        archived: Option<bool>,
    ) -> Result<Vec<Project>, TrackerError> {
        let projects = self.visible_projects(organization_id, user_id, admin).await?;
        Ok(projects
            .into_iter()
            .filter(|p| archived.is_none_or(|a| p.archived == a))
            .collect())
    }

    /// Projects whose team includes `user_id`, across organizations.
    pub async fn user_projects(&self, user_id: Uuid) -> Result<Vec<Project>, TrackerError> {
        let members: Vec<ProjectMember> = self.list("project_member:").await?;
        let mut projects = Vec::new();
        for member in members.into_iter().filter(|m| m.user_id == user_id) {
            if let Some(project) = self.get_project(member.project_id).await? {
                projects.push(project);
            }
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> Result<Project, TrackerError> {
        let db = self.db.write().await;
        let mut project: Project = decode(&db, &keys::project(id))?
            .ok_or_else(|| TrackerError::NotFound(format!("Project {}", id)))?;
        project.apply(update);

        let mut batch = WriteBatch::new();
        batch.put(keys::project(id), encode(&project)?);
        db.apply(batch)?;

        info!(project_id = %id, "Project updated");
        Ok(project)
    }

    /// Resource-role guard for project writes.
    ///
    /// Passes for an admin of the project's organization or a manager of the
    /// project, both read from the store now. A missing project is reported
    /// before the role is looked at.
    pub async fn authorize_project_manager(&self, project_id: Uuid, user_id: Uuid) -> Result<Project, TrackerError> {
        let project = self.require_project(project_id).await?;

        let admin = self
            .membership(project.organization_id, user_id)
            .await?
            .is_some_and(|m| m.admin);
        if admin {
            return Ok(project);
        }

        let manager = self
            .load::<ProjectMember>(&keys::project_member(project_id, user_id))
            .await?
            .is_some_and(|m| m.manager);
        if manager {
            return Ok(project);
        }

        Err(TrackerError::Forbidden(format!(
            "User {} cannot manage project {}",
            user_id, project_id
        )))
    }

    pub async fn add_project_user(&self, project_id: Uuid, user_id: Uuid, manager: bool) -> Result<ProjectMember, TrackerError> {
        self.require_project(project_id).await?;
        self.require_user(user_id).await?;

        let key = keys::project_member(project_id, user_id);
        let db = self.db.write().await;
        if db.contains_key(&key)? {
            return Err(TrackerError::AlreadyExists(format!(
                "Membership of user {} in project {}",
                user_id, project_id
            )));
        }
        let member = ProjectMember {
            project_id,
            user_id,
            manager,
        };
        let mut batch = WriteBatch::new();
        batch.put(key, encode(&member)?);
        db.apply(batch)?;

        info!(project_id = %project_id, user_id = %user_id, manager, "User added to project");
        Ok(member)
    }

    pub async fn remove_project_user(&self, project_id: Uuid, user_id: Uuid) -> Result<(), TrackerError> {
        let key = keys::project_member(project_id, user_id);
        let db = self.db.write().await;
        if !db.contains_key(&key)? {
            return Err(TrackerError::NotFound(format!(
                "Membership of user {} in project {}",
                user_id, project_id
            )));
        }
        let mut batch = WriteBatch::new();
        batch.delete(key);
        db.apply(batch)?;

        info!(project_id = %project_id, user_id = %user_id, "User removed from project");
        Ok(())
    }

    pub async fn is_manager_anywhere(&self, user_id: Uuid) -> Result<bool, TrackerError> {
        let members: Vec<ProjectMember> = self.list("project_member:").await?;
        Ok(members.iter().any(|m| m.user_id == user_id && m.manager))
    }

    // === TAXONOMY ===

    pub async fn create_taxonomy_entry(
        &self,
        organization_id: Uuid,
        kind: TaxonomyKind,
        input: NewTaxonomyEntry,
    ) -> Result<TaxonomyEntry, TrackerError> {
        let entry = TaxonomyEntry::new(organization_id, kind, input);
        let mut batch = WriteBatch::new();
        batch.put(keys::taxonomy(kind, entry.id), encode(&entry)?);
        self.commit(batch).await?;

        info!(organization_id = %organization_id, kind = %kind, value = %entry.value, "Taxonomy entry created");
        Ok(entry)
    }

    /// Entries of one kind for an organization, in listing order.
    pub async fn taxonomy(&self, organization_id: Uuid, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, TrackerError> {
        let mut entries: Vec<TaxonomyEntry> = self
            .list::<TaxonomyEntry>(&keys::taxonomies(kind))
            .await?
            .into_iter()
            .filter(|e| e.organization_id == organization_id)
            .collect();
        entries.sort_by(TaxonomyEntry::listing_order);
        Ok(entries)
    }

    pub async fn taxonomy_entry(&self, kind: TaxonomyKind, id: Uuid) -> Result<Option<TaxonomyEntry>, TrackerError> {
        self.load(&keys::taxonomy(kind, id)).await
    }

    /// Resolve a classification id a ticket is about to take.
    ///
    /// Entries of another organization do not resolve.
    async fn resolve_entry(&self, kind: TaxonomyKind, id: Uuid, organization_id: Uuid) -> Result<TaxonomyEntry, TrackerError> {
        self.taxonomy_entry(kind, id)
            .await?
            .filter(|e| e.organization_id == organization_id)
            .ok_or_else(|| TrackerError::NotFound(format!("{} {}", kind, id)))
    }

    /// Label of a stored classification id. Unset or vanished ids read as `Nil`.
    async fn resolve_label(&self, kind: TaxonomyKind, id: Option<Uuid>) -> Result<Label, TrackerError> {
        match id {
            Some(id) => Ok(Label::of(self.taxonomy_entry(kind, id).await?.as_ref())),
            None => Ok(Label::nil()),
        }
    }

    // === TICKET ===

    async fn require_assignee(&self, assigned_id: Option<Uuid>) -> Result<(), TrackerError> {
        if let Some(id) = assigned_id {
            self.require_user(id).await?;
        }
        Ok(())
    }

    /// Create a ticket and one history row per classification field it starts with.
    pub async fn create_ticket(&self, creator_id: Uuid, input: NewTicket) -> Result<Ticket, TrackerError> {
        let project = self.require_project(input.project_id).await?;
        self.require_assignee(input.assigned_id).await?;

        let classification = Classification::from(&input);
        let ticket = Ticket::new(creator_id, input);

        let mut batch = WriteBatch::new();
        batch.put(keys::ticket(ticket.id), encode(&ticket)?);
        for change in classification.initial_changes() {
            let Some(next_id) = change.next else { continue };
            let entry = self.resolve_entry(change.kind, next_id, project.organization_id).await?;
            let row = history::record(
                ticket.id,
                creator_id,
                change.kind,
                Label::nil(),
                Label::from(&entry),
                ticket.created_at,
            );
            batch.put(keys::history(ticket.id, row.id), encode(&row)?);
        }
        let recorded = batch.len() - 1;
        self.commit(batch).await?;

        info!(ticket_id = %ticket.id, project_id = %project.id, creator = %creator_id, history = recorded, "Ticket created");
        Ok(ticket)
    }

    /// Read phase of an update: load the ticket, diff its classification and
    /// resolve the labels of every changed field.
    pub async fn plan_ticket_update(&self, user_id: Uuid, ticket_id: Uuid, update: TicketUpdate) -> Result<TicketUpdatePlan, TrackerError> {
        let mut ticket: Ticket = self
            .load(&keys::ticket(ticket_id))
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("Ticket {}", ticket_id)))?;
        let project = self.require_project(ticket.project_id).await?;
        self.require_assignee(update.assigned_id).await?;

        let changes = Classification::from(&update).changes_from(&Classification::from(&ticket));
        let mut resolved = Vec::with_capacity(changes.len());
        for change in changes {
            let previous = self.resolve_label(change.kind, change.previous).await?;
            let next = match change.next {
                Some(id) => Label::from(&self.resolve_entry(change.kind, id, project.organization_id).await?),
                None => Label::nil(),
            };
            resolved.push((change.kind, previous, next));
        }

        ticket.apply(update);
        let history = resolved
            .into_iter()
            .map(|(kind, previous, next)| history::record(ticket.id, user_id, kind, previous, next, ticket.updated_at))
            .collect();

        Ok(TicketUpdatePlan { ticket, history })
    }

    /// Write phase of an update: the row and its history rows in one batch.
    pub async fn commit_ticket_update(&self, plan: TicketUpdatePlan) -> Result<Ticket, TrackerError> {
        let mut batch = WriteBatch::new();
        batch.put(keys::ticket(plan.ticket.id), encode(&plan.ticket)?);
        for row in &plan.history {
            batch.put(keys::history(row.ticket_id, row.id), encode(row)?);
        }
        self.commit(batch).await?;

        info!(ticket_id = %plan.ticket.id, history = plan.history.len(), "Ticket updated");
        Ok(plan.ticket)
    }

    pub async fn update_ticket(&self, user_id: Uuid, ticket_id: Uuid, update: TicketUpdate) -> Result<Ticket, TrackerError> {
        let plan = self.plan_ticket_update(user_id, ticket_id, update).await?;
        self.commit_ticket_update(plan).await
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, TrackerError> {
        self.load(&keys::ticket(id)).await
    }

    async fn summarize(&self, ticket: Ticket) -> Result<TicketSummary, TrackerError> {
        let project = self.get_project(ticket.project_id).await?;
        let mut resolved = [None, None, None];
        for kind in TaxonomyKind::ALL {
            if let Some(id) = ticket.classification(kind) {
                resolved[kind as usize] = self.taxonomy_entry(kind, id).await?;
            }
        }
        let [ticket_priority, ticket_status, ticket_type] = resolved;
        Ok(TicketSummary {
            ticket,
            project,
            ticket_priority,
            ticket_status,
            ticket_type,
        })
    }

    async fn summaries(&self, mut tickets: Vec<Ticket>) -> Result<Vec<TicketSummary>, TrackerError> {
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut summaries = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            summaries.push(self.summarize(ticket).await?);
        }
        Ok(summaries)
    }

    async fn user_summary(&self, id: Option<Uuid>) -> Result<Option<UserSummary>, TrackerError> {
        match id {
            Some(id) => Ok(self.get_user(id).await?.as_ref().map(UserSummary::from)),
            None => Ok(None),
        }
    }

    pub async fn ticket_detail(&self, id: Uuid) -> Result<TicketDetail, TrackerError> {
        let ticket = self
            .get_ticket(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("Ticket {}", id)))?;
        let creator = self.user_summary(Some(ticket.creator_id)).await?;
        let assigned = self.user_summary(ticket.assigned_id).await?;
        let comments = self.ticket_comments(id).await?;
        let history = self.ticket_history(id).await?;
        let summary = self.summarize(ticket).await?;

        Ok(TicketDetail {
            summary,
            creator,
            assigned,
            comments,
            history,
        })
    }

    /// Every ticket whose project belongs to the organization.
    async fn tickets_in(&self, organization_id: Uuid) -> Result<Vec<Ticket>, TrackerError> {
        let projects: HashSet<Uuid> = self
            .list::<Project>("project:")
            .await?
            .into_iter()
            .filter(|p| p.organization_id == organization_id)
            .map(|p| p.id)
            .collect();
        Ok(self
            .list::<Ticket>("ticket:")
            .await?
            .into_iter()
            .filter(|t| projects.contains(&t.project_id))
            .collect())
    }

    /// Tickets of the organization, newest first.
    pub async fn organization_tickets(&self, organization_id: Uuid, archived: Option<bool>) -> Result<Vec<TicketSummary>, TrackerError> {
        let tickets = self
            .tickets_in(organization_id)
            .await?
            .into_iter()
            .filter(|t| archived.is_none_or(|a| t.archived == a))
            .collect();
        self.summaries(tickets).await
    }

    pub async fn assigned_tickets(&self, user_id: Uuid) -> Result<Vec<TicketSummary>, TrackerError> {
        let tickets = self
            .list::<Ticket>("ticket:")
            .await?
            .into_iter()
            .filter(|t| t.assigned_id == Some(user_id))
            .collect();
        self.summaries(tickets).await
    }

    pub async fn submitted_tickets(&self, user_id: Uuid) -> Result<Vec<TicketSummary>, TrackerError> {
        let tickets = self
            .list::<Ticket>("ticket:")
            .await?
            .into_iter()
            .filter(|t| t.creator_id == user_id)
            .collect();
        self.summaries(tickets).await
    }

    // === COMMENT ===

    pub async fn add_comment(&self, ticket_id: Uuid, creator_id: Uuid, input: NewComment) -> Result<TicketComment, TrackerError> {
        if self.get_ticket(ticket_id).await?.is_none() {
            return Err(TrackerError::NotFound(format!("Ticket {}", ticket_id)));
        }
        let comment = TicketComment::new(ticket_id, creator_id, input);
        let mut batch = WriteBatch::new();
        batch.put(keys::comment(ticket_id, comment.id), encode(&comment)?);
        self.commit(batch).await?;

        info!(ticket_id = %ticket_id, comment_id = %comment.id, creator = %creator_id, "Comment added");
        Ok(comment)
    }

    /// Comments of a ticket, newest first.
    pub async fn ticket_comments(&self, ticket_id: Uuid) -> Result<Vec<CommentView>, TrackerError> {
        let mut comments: Vec<TicketComment> = self.list(&keys::comments(ticket_id)).await?;
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            let creator = self.user_summary(Some(comment.creator_id)).await?;
            views.push(CommentView { comment, creator });
        }
        Ok(views)
    }

    // === HISTORY ===

    /// History of a ticket, newest first.
    pub async fn ticket_history(&self, ticket_id: Uuid) -> Result<Vec<HistoryView>, TrackerError> {
        let mut entries: Vec<TicketHistory> = self.list(&keys::histories(ticket_id)).await?;
        entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));

        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let user = self.user_summary(Some(entry.user_id)).await?;
            views.push(HistoryView { entry, user });
        }
        Ok(views)
    }

    // === DASHBOARD ===

    pub async fn dashboard(&self, organization_id: Uuid, user_id: Uuid, admin: bool) -> Result<Dashboard, TrackerError> {
        let projects = self.visible_projects(organization_id, user_id, admin).await?;
        let tickets = self.tickets_in(organization_id).await?;

        let mut taxonomies = HashMap::new();
        for kind in TaxonomyKind::ALL {
            taxonomies.insert(kind, self.taxonomy(organization_id, kind).await?);
        }

        let important: HashSet<Uuid> = match taxonomies[&TaxonomyKind::Priority].first() {
            Some(top) => taxonomies[&TaxonomyKind::Priority]
                .iter()
                .filter(|e| e.rank == top.rank)
                .map(|e| e.id)
                .collect(),
            None => HashSet::new(),
        };

        let slices = |project_id: Uuid, kind: TaxonomyKind| -> Vec<ChartSlice> {
            taxonomies[&kind]
                .iter()
                .map(|entry| ChartSlice {
                    key: entry.value.clone(),
                    colour: entry.colour.clone(),
                    value: tickets
                        .iter()
                        .filter(|t| t.project_id == project_id && t.classification(kind) == Some(entry.id))
                        .count(),
                })
                .collect()
        };

        let breakdown = projects
            .iter()
            .map(|p| ProjectBreakdown {
                project_id: p.id,
                project: p.name.clone(),
                priority: slices(p.id, TaxonomyKind::Priority),
                status: slices(p.id, TaxonomyKind::Status),
                r#type: slices(p.id, TaxonomyKind::Type),
            })
            .collect();

        Ok(Dashboard {
            active_projects: projects.iter().filter(|p| !p.archived).count(),
            important_tickets: tickets
                .iter()
                .filter(|t| t.ticket_priority_id.is_some_and(|id| important.contains(&id)))
                .count(),
            unresolved_tickets: tickets.iter().filter(|t| !t.archived).count(),
            unassigned_tickets: tickets.iter().filter(|t| t.assigned_id.is_none()).count(),
            projects: breakdown,
        })
    }
}
