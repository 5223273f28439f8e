//! sessionctl
//!
//! Command-line client for a session-authenticated API:
//! 1. Loads configuration and restores persisted credentials
//! 2. Runs one command (login, register, me, logout, get)
//! 3. Refreshes an expired access token transparently, once per request
//! 4. Reports a session that could not be recovered and must log in again

mod config;
mod metrics;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_auth::{CredentialStore, FileKeyValueStore, RegisterRequest};
use session_client::{AuthApi, SessionClient, SessionEvent};
use transport::HttpTransport;

use crate::config::Config;

/// Command-line client for a session-authenticated API
#[derive(Debug, Parser)]
#[command(name = "sessionctl")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, env = "CONFIG_PATH", default_value = "session-cli.toml")]
    config: PathBuf,

    /// Write Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Log in and store the issued tokens
    Login { email: String, password: String },
    /// Create an account
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Show the current user
    Me,
    /// End the session and clear stored tokens
    Logout,
    /// GET an API path with the stored session
    Get { path: String },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Me => "me",
            Command::Logout => "logout",
            Command::Get { .. } => "get",
        }
    }
}

/// Run one command and return what to print on stdout.
async fn run(api: &AuthApi, command: &Command) -> Result<String> {
    match command {
        Command::Login { email, password } => {
            let user = api.login(email, password).await.context("login failed")?;
            Ok(serde_json::to_string_pretty(&user)?)
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let request = RegisterRequest {
                name: name.clone(),
                email: email.clone(),
                password: password.clone(),
            };
            let user = api
                .register(&request)
                .await
                .context("registration failed")?;
            Ok(serde_json::to_string_pretty(&user)?)
        }
        Command::Me => {
            let user = api
                .current_user()
                .await
                .context("fetching current user failed")?;
            Ok(serde_json::to_string_pretty(&user)?)
        }
        Command::Logout => {
            api.logout().await;
            Ok("logged out".to_string())
        }
        Command::Get { path } => {
            let client = api.client();
            let descriptor = client.get(path)?;
            let response = client
                .send(&descriptor)
                .await
                .with_context(|| format!("GET {path} failed"))?;
            Ok(response.text())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr; stdout carries command output only
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let prometheus = if cli.metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let config_path = cli.config;
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        credentials_path = %config.storage.credentials_path.display(),
        "configuration loaded"
    );

    let backend = FileKeyValueStore::open(config.storage.credentials_path.clone())
        .await
        .context("failed to open credential storage")?;
    let store = Arc::new(
        CredentialStore::load(Arc::new(backend))
            .await
            .context("failed to restore credentials")?,
    );
    let transport = Arc::new(HttpTransport::new(reqwest::Client::new(), config.timeout()));
    let client = SessionClient::new(
        &config.api.base_url,
        config.api.endpoints.clone(),
        transport,
        store,
    )?;
    let mut events = client.subscribe();
    let api = AuthApi::new(Arc::new(client));

    let result = run(&api, &cli.command).await;
    metrics::record_command(cli.command.name(), result.is_ok());

    while let Ok(SessionEvent::Ended { reason }) = events.try_recv() {
        warn!(reason = %reason, "session ended, log in again");
    }

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!(command = cli.command.name(), error = %format!("{e:#}"), "command failed");
            Err(e)
        }
    }
}
