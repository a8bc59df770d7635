// src/lib.rs

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod history;
pub mod middleware;
pub mod models;
pub mod raddb;
pub mod rpc;
pub mod session;
pub mod telemetry;
pub mod tracker_service;
pub mod validation;
pub mod web;

pub use middleware::AppState;
pub use tracker_service::{TrackerError, TrackerService};
pub use web::create_router;
