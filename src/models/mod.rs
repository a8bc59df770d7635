// src/models/mod.rs

pub mod organization;
pub mod user;
pub mod project;
pub mod taxonomy;
pub mod ticket;
pub mod history;
pub mod views;

// Re-exports

pub use organization::{Membership, NewOrganization, Organization, SwitchOrganization};
pub use user::{User, UserSettings, UserSummary};
pub use project::{NewProject, NewProjectMember, Project, ProjectMember, ProjectUpdate, RemoveProjectMember, TeamMember};
pub use taxonomy::{NewTaxonomyEntry, TaxonomyEntry, TaxonomyKind};
pub use ticket::{NewComment, NewTicket, Ticket, TicketComment, TicketUpdate};
pub use history::{Label, TicketHistory};
pub use views::{ChartSlice, CommentView, Dashboard, HistoryView, ProjectBreakdown, ProjectDetail, TicketDetail, TicketSummary};
