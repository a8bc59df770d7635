// src/cli.rs

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::config::{self, AppConfig};
use crate::middleware::AppState;
use crate::models::NewOrganization;
use crate::session::IdentityProfile;
use crate::telemetry;
use crate::tracker_service::TrackerService;
use crate::web::run_web_server;

type CliResult = Result<(), Box<dyn std::error::Error>>;

// === CLI ===

#[derive(Parser)]
#[command(name = "pmtrack", author, version, about = "Multi-tenant project and ticket tracker", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./pmtrack.yaml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Overrides web_server.address
        #[arg(long)]
        address: Option<String>,
        /// Keep everything in memory
        #[arg(long)]
        ephemeral: bool,
    },
    /// Configuration file management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
    /// Organizations
    Org {
        #[command(subcommand)]
        cmd: OrgCommand,
    },
    /// Users
    User {
        #[command(subcommand)]
        cmd: UserCommand,
    },
    /// Session tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

// === Subcommands ===

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a configuration with fresh keys
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum OrgCommand {
    Create {
        name: String,
        /// Owner, made admin of the new organization
        #[arg(long)]
        owner_email: String,
        #[arg(long)]
        description: Option<String>,
    },
    List {
        #[arg(short, long)]
        json: bool,
    },
    AddMember {
        organization_id: Uuid,
        #[arg(long)]
        email: String,
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user ahead of their first sign-in
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    List {
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    Issue {
        #[arg(long)]
        email: String,
    },
}

/// Entry point of the binary.
pub async fn run_cli() -> CliResult {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config_path = config::resolve_path(cli.config);

    if let Command::Config { cmd: ConfigCommand::Init { force } } = &cli.command {
        return init_config(&config_path, *force);
    }

    let config = AppConfig::load(&config_path)?;
    telemetry::init(&config.logging);

    match cli.command {
        Command::Serve { address, ephemeral } => serve(config, address, ephemeral).await,
        Command::Config { .. } => Ok(()),
        Command::Org { cmd } => handle_org(cmd, &open_service(&config)?).await,
        Command::User { cmd } => handle_user(cmd, &open_service(&config)?).await,
        Command::Token { cmd } => handle_token(cmd, &config, &open_service(&config)?).await,
    }
}

fn init_config(path: &Path, force: bool) -> CliResult {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    AppConfig::generate().save(path)?;
    println!("✅ Configuration written to {}", path.display());
    Ok(())
}

fn open_service(config: &AppConfig) -> Result<TrackerService, Box<dyn std::error::Error>> {
    let key = config.master_key()?;
    let service = TrackerService::open(&config.db_path, &key)?
        .with_switch_membership(config.security.require_membership_on_switch);
    Ok(service)
}

async fn serve(mut config: AppConfig, address: Option<String>, ephemeral: bool) -> CliResult {
    if let Some(address) = address {
        config.web_server.address = address;
    }
    let service = if ephemeral {
        info!("Using an in-memory store");
        TrackerService::in_memory().with_switch_membership(config.security.require_membership_on_switch)
    } else {
        open_service(&config)?
    };
    let tokens = TokenIssuer::from_config(&config.security.jwt)?;
    let state = AppState::new(service, tokens, config.security.identity.callback_secret.clone());

    run_web_server(state, &config.web_server).await
}

// === Handlers ===

async fn require_user_by_email(service: &TrackerService, email: &str) -> Result<crate::models::User, Box<dyn std::error::Error>> {
    service
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| format!("No user with email {}", email).into())
}

async fn handle_org(cmd: OrgCommand, service: &TrackerService) -> CliResult {
    match cmd {
        OrgCommand::Create {
            name,
            owner_email,
            description,
        } => {
            let owner = require_user_by_email(service, &owner_email).await?;
            let organization = service
                .create_organization(owner.id, NewOrganization { name, description })
                .await?;
            println!("✅ Organization created: {} ({})", organization.name, organization.id);
        }
        OrgCommand::List { json } => {
            let organizations = service.all_organizations().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&organizations)?);
            } else {
                for organization in organizations {
                    println!("{} | {}", organization.name, organization.id);
                }
            }
        }
        OrgCommand::AddMember {
            organization_id,
            email,
            admin,
        } => {
            let user = require_user_by_email(service, &email).await?;
            service.add_member(organization_id, user.id, admin).await?;
            println!("✅ {} added to organization {}", user.display_name(), organization_id);
        }
    }
    Ok(())
}

async fn handle_user(cmd: UserCommand, service: &TrackerService) -> CliResult {
    match cmd {
        UserCommand::Add { email, name } => {
            let user = service
                .sign_in(IdentityProfile {
                    email,
                    name,
                    image: None,
                })
                .await?;
            println!("✅ User: {} ({})", user.display_name(), user.id);
        }
        UserCommand::List { json } => {
            let users = service.all_users().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for user in users {
                    println!("{} | {}", user.display_name(), user.id);
                }
            }
        }
    }
    Ok(())
}

async fn handle_token(cmd: TokenCommand, config: &AppConfig, service: &TrackerService) -> CliResult {
    match cmd {
        TokenCommand::Issue { email } => {
            let user = require_user_by_email(service, &email).await?;
            let tokens = TokenIssuer::from_config(&config.security.jwt)?;
            let issued = tokens.issue(user.id)?;
            println!("{}", issued.token);
        }
    }
    Ok(())
}
