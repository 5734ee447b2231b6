//! Wardgate server entry point.
//!
//! # Configuration
//!
//! Settings come from the TOML file given with `--config`, overridden by
//! environment variables:
//!
//! - `WARDGATE_DB_URL` (`ws://host:port`, or `mem://` for a throwaway
//!   in-memory store), `WARDGATE_DB_NAMESPACE`, `WARDGATE_DB_DATABASE`,
//!   `WARDGATE_DB_USERNAME`, `WARDGATE_DB_PASSWORD`
//! - `WARDGATE_JWT_PRIVATE_KEY`, `WARDGATE_JWT_PUBLIC_KEY` (PEM)
//! - `WARDGATE_PEPPER`
//! - `WARDGATE_SUMMARIZER_API_KEY`
//! - `WARDGATE_SIGN_OUT_TIMEOUT_SECS`
//!
//! Log filtering follows `RUST_LOG`, defaulting to `wardgate=info`.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use surrealdb::engine::any::Any;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wardgate_auth::resolver::NewAdmin;
use wardgate_auth::{LocalIdentityProvider, RegisterHospital, SessionResolver};
use wardgate_clinic::{ClinicService, GeminiSummarizer};
use wardgate_core::models::hospital::CreateHospital;
use wardgate_core::repository::{AccountRepository, SessionRepository};
use wardgate_db::DbManager;
use wardgate_db::repository::{
    SurrealAccountRepository, SurrealHospitalRepository, SurrealProfileRepository,
    SurrealSessionRepository,
};

use crate::config::ServerConfig;

type Provider = LocalIdentityProvider<
    SurrealAccountRepository<Any>,
    SurrealSessionRepository<Any>,
    SurrealProfileRepository<Any>,
>;
type Resolver =
    SessionResolver<Provider, SurrealProfileRepository<Any>, SurrealHospitalRepository<Any>>;

/// Wardgate hospital-management backend
#[derive(Parser, Debug)]
#[command(name = "wardgate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations and exit
    Migrate,

    /// Create a hospital together with its administrator account
    RegisterHospital {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        license_number: String,
        #[arg(long)]
        admin_first_name: String,
        #[arg(long)]
        admin_last_name: String,
        #[arg(long)]
        admin_email: String,
        /// Initial administrator password (also: WARDGATE_ADMIN_PASSWORD)
        #[arg(long, env = "WARDGATE_ADMIN_PASSWORD")]
        admin_password: String,
    },

    /// Confirm the email address of a signed-up account
    Confirm {
        #[arg(long)]
        email: String,
    },

    /// Sign in and print the dashboard figures of the staff member's hospital
    Stats {
        #[arg(long)]
        email: String,
        /// Password (also: WARDGATE_PASSWORD)
        #[arg(long, env = "WARDGATE_PASSWORD")]
        password: String,
    },

    /// Keep the session resolver and the session sweeper running until
    /// interrupted
    Serve,
}

struct App {
    store: DbManager,
    accounts: SurrealAccountRepository<Any>,
    provider: Arc<Provider>,
    resolver: Arc<Resolver>,
}

impl App {
    async fn connect(config: &ServerConfig) -> Result<Self> {
        let store = DbManager::connect(&config.database)
            .await
            .context("opening the store")?;
        let db = store.client().clone();

        let accounts = store.accounts(config.auth.pepper.as_deref());
        let provider = Arc::new(LocalIdentityProvider::new(
            accounts.clone(),
            SurrealSessionRepository::new(db.clone()),
            SurrealProfileRepository::new(db.clone()),
            config.auth.clone(),
        ));
        let resolver = Arc::new(SessionResolver::new(
            Arc::clone(&provider),
            SurrealProfileRepository::new(db.clone()),
            SurrealHospitalRepository::new(db),
            config.resolver.clone(),
        ));

        Ok(Self {
            store,
            accounts,
            provider,
            resolver,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wardgate=info")),
        )
        .json()
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref()).context("loading configuration")?;

    let app = App::connect(&config).await?;

    match args.command {
        Command::Migrate => {
            info!("schema is up to date");
        }
        Command::RegisterHospital {
            name,
            address,
            phone,
            license_number,
            admin_first_name,
            admin_last_name,
            admin_email,
            admin_password,
        } => {
            app.resolver
                .register_hospital(RegisterHospital {
                    hospital: CreateHospital {
                        name,
                        address,
                        phone,
                        license_number,
                    },
                    admin: NewAdmin {
                        first_name: admin_first_name,
                        last_name: admin_last_name,
                        email: admin_email.clone(),
                        password: admin_password,
                    },
                })
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            info!(email = %admin_email, "hospital registered; confirm the administrator to sign in");
        }
        Command::Confirm { email } => {
            let account = app
                .accounts
                .get_by_email(&email)
                .await
                .with_context(|| format!("looking up {email}"))?;
            app.provider.confirm_account(account.id).await?;
        }
        Command::Stats { email, password } => {
            app.resolver.start().await;
            app.resolver
                .login(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            let clinic = ClinicService::new(
                app.store.records(),
                Arc::clone(&app.provider),
                GeminiSummarizer::new(config.summarizer.clone()),
                app.resolver.subscribe(),
            );
            let stats = clinic.dashboard_stats().await;
            app.resolver.logout().await;
            println!("{}", serde_json::to_string_pretty(&stats?)?);
        }
        Command::Serve => serve(&app, &config).await?,
    }

    Ok(())
}

async fn serve(app: &App, config: &ServerConfig) -> Result<()> {
    app.resolver.start().await;
    let listener = app.resolver.spawn_listener();

    let sweeper = config.session_cleanup_interval_secs.map(|secs| {
        let sessions = SurrealSessionRepository::new(app.store.client().clone());
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                ticks.tick().await;
                match sessions.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "expired sessions removed"),
                    Err(e) => warn!(error = %e, "session cleanup failed"),
                }
            }
        })
    });

    info!("wardgate is running");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    listener.abort();
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("wardgate stopped");
    Ok(())
}
