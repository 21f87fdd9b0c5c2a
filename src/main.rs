//! # Voxlead — lead intake & delayed follow-up dispatch
//!
//! Backend for an AI voice-calling product's lead funnel: HTTP intake of
//! demo-call bookings, an outbound-call vendor client, and the delayed
//! follow-up email dispatch job.
//!
//! Usage:
//!   voxlead serve                  # Start the gateway (default)
//!   voxlead dispatch               # Run one dispatch pass and print the report
//!   voxlead init                   # Write the default config and create the DB

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxlead_channels::Mailer;
use voxlead_core::VoxleadConfig;
use voxlead_dispatch::DispatchJob;
use voxlead_store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "voxlead",
    version,
    about = "📞 Voxlead — lead intake & follow-up dispatch service"
)]
struct Cli {
    /// Path to config.toml (default: ~/.voxlead/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gateway server (default)
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one dispatch pass and print the run report as JSON
    Dispatch,
    /// Write the default config file and create the database
    Init,
}

fn load_config(cli: &Cli) -> Result<VoxleadConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            VoxleadConfig::load_from(Path::new(&expanded))?
        }
        None => VoxleadConfig::load()?,
    };
    config.apply_env_overrides();
    Ok(config)
}

fn open_store(config: &VoxleadConfig) -> Result<SqliteStore> {
    let db_path = shellexpand::tilde(&config.database.path).to_string();
    if let Some(parent) = Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(SqliteStore::open(Path::new(&db_path))?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Init must work before any config file exists.
    if matches!(cli.command, Some(Command::Init)) {
        let config = VoxleadConfig::default();
        let path = VoxleadConfig::default_path();
        if path.exists() {
            println!("⚠️  Config already exists: {}", path.display());
        } else {
            config.save()?;
            println!("✅ Config written: {}", path.display());
        }
        let store = open_store(&config)?;
        println!("✅ Database ready ({} lead(s))", store.count()?);
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            println!("📞 Voxlead v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "   🌐 Gateway:   http://{}:{}",
                config.server.host, config.server.port
            );
            println!("   🗄️  Database:  {}", config.database.path);
            println!(
                "   ⏰ Dispatch:  every {}s (0 = external cron)",
                config.dispatch.interval_secs
            );
            println!();
            voxlead_gateway::start(config).await?;
        }
        Command::Dispatch => {
            let store = Arc::new(open_store(&config)?);
            let mailer = Arc::new(Mailer::new(config.smtp.clone()));
            let job = DispatchJob::new(store, mailer);
            let report = job.run(chrono::Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Init => unreachable!("handled above"),
    }

    Ok(())
}
