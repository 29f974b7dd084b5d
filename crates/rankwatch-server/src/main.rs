//! rankwatch-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `RANKWATCH_*` environment variables, opens the SQLite store, and either
//! serves the HTTP API or runs a single batch.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[users]]` entry:
//!
//! ```text
//! cargo run -p rankwatch-server -- hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use rankwatch_api::ApiState;
use rankwatch_checker::RankChecker;
use rankwatch_core::store::RankStore;
use rankwatch_search::BraveClient;
use rankwatch_server::ServerConfig;
use rankwatch_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Rankwatch keyword rank tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Run one batch for a site and print the report as JSON.
  Check {
    #[arg(long)]
    site: Uuid,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => hash_password(),
    Command::Serve => {
      let cfg = load_config(&cli.config)?;
      serve(cfg).await
    }
    Command::Check { site } => {
      let cfg = load_config(&cli.config)?;
      check(cfg, site).await
    }
  }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("RANKWATCH"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<Arc<SqliteStore>> {
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  Ok(Arc::new(store))
}

fn search_client(cfg: &ServerConfig) -> anyhow::Result<Arc<BraveClient>> {
  let client = BraveClient::new(cfg.brave_config()).context("failed to build search client")?;
  Ok(Arc::new(client))
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  if cfg.users.is_empty() {
    tracing::warn!("no users configured; every API request will be rejected");
  }

  let store = open_store(&cfg).await?;
  let checker = RankChecker::new(store.clone(), search_client(&cfg)?, cfg.batch_options());
  let state = ApiState { store, checker: Arc::new(checker) };

  let app = rankwatch_server::router(state, Arc::new(cfg.auth_config()));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn check(cfg: ServerConfig, site_id: Uuid) -> anyhow::Result<()> {
  let store = open_store(&cfg).await?;

  let site = store
    .get_site(site_id)
    .await
    .context("failed to load site")?
    .with_context(|| format!("site {site_id} not found"))?;

  let checker = RankChecker::new(store, search_client(&cfg)?, cfg.batch_options());
  let report = checker
    .check_all(site.site_id, &site.domain)
    .await
    .with_context(|| format!("rank check for {} failed", site.domain))?;

  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

fn hash_password() -> anyhow::Result<()> {
  let password = read_password()?;
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
    .to_string();
  println!("{hash}");
  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
