use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use groundwork_config::{AppConfig, ConfigLoader};
use groundwork_db::Migrator;
use groundwork_gateway::GatewayServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "groundwork", version, about = "Full-stack application starter")]
struct Cli {
    /// Path to a YAML or TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway
    Serve,
    /// Apply pending SQL migrations, then exit
    Migrate {
        /// Override the configured migrations directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Serve => serve(config).await,
        Command::Migrate { dir } => migrate(config, dir).await,
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    ExitCode::from(exit_status(&result))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    print_startup(&config);
    GatewayServer::new(config).run().await?;
    Ok(())
}

async fn migrate(config: AppConfig, dir_override: Option<PathBuf>) -> anyhow::Result<()> {
    let pool = groundwork_db::pool::connect(&config.database).await?;
    let dir = dir_override.unwrap_or_else(|| config.migrations.dir.clone());

    let mut migrator = Migrator::new(pool, dir);
    if let Some(ms) = config.database.statement_timeout_ms {
        migrator = migrator.with_statement_timeout_ms(ms);
    }

    let applied = migrator.run().await?;
    info!("migration run finished: {applied} newly applied");
    Ok(())
}

/// Process exit status for a finished command: 0 on success, 1 on any
/// failure.
fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn print_startup(config: &AppConfig) {
    let mode = if config.environment.is_development() {
        "development"
    } else {
        "production"
    };

    println!("groundwork v{}", env!("CARGO_PKG_VERSION"));
    println!("  mode:       {mode}");
    println!(
        "  listening:  http://{}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("  frontend:   {}", config.gateway.frontend_url);
    println!();
}
