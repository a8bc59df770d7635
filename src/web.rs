// src/web.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::ServerConfig;
use crate::middleware::AppState;
use crate::models::TaxonomyKind;
use crate::rpc;

pub mod dashboard;
pub mod login;
pub mod organizations;
pub mod projects;
pub mod tickets;
pub mod users;

/// `?archived=` filter shared by the project and ticket listings.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct ArchivedFilter {
    pub archived: Option<bool>,
}

/// REST routes plus the procedure endpoint. Unlisted methods answer 405.
pub fn create_router(state: AppState, max_request_size: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/callback", post(login::callback))
        .route("/api/auth/session", get(login::session))
        .route(
            "/api/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route("/api/users", get(users::list))
        .route(
            "/api/users/:user_id/settings/organization",
            put(users::switch_organization),
        )
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/mine", get(projects::mine))
        .route("/api/projects/:id", get(projects::detail).patch(projects::update))
        .route(
            "/api/projects/:id/users",
            get(projects::team)
                .post(projects::add_user)
                .delete(projects::remove_user),
        )
        .route("/api/tickets", get(tickets::list).post(tickets::create))
        .route("/api/tickets/assigned", get(tickets::assigned))
        .route("/api/tickets/submitted", get(tickets::submitted))
        .route("/api/tickets/ticketPriorities", tickets::taxonomy_routes(TaxonomyKind::Priority))
        .route("/api/tickets/ticketStatuses", tickets::taxonomy_routes(TaxonomyKind::Status))
        .route("/api/tickets/ticketTypes", tickets::taxonomy_routes(TaxonomyKind::Type))
        .route("/api/tickets/:id", get(tickets::detail).patch(tickets::update))
        .route("/api/tickets/:id/comments", post(tickets::add_comment))
        .route("/api/dashboard", get(dashboard::get))
        .route("/api/trpc/:procedure", get(rpc::query).post(rpc::mutation))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_request_size))
                .layer(cors),
        )
}

pub async fn run_web_server(state: AppState, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = state.service.clone();
    let app = create_router(state, config.max_request_size);

    let listener = tokio::net::TcpListener::bind(&config.address).await?;
    info!(address = %config.address, "Web API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    service.flush().await?;
    Ok(())
}
