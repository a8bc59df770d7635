// tests/integration/main.rs

mod common;

mod auth;
mod organizations;
mod projects;
mod rpc;
mod tickets;
