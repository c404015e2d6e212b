use anyhow::Result;
use clap::{Parser, Subcommand};
use logstream_core::{config::Config, migration, server, telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "logstream-core")]
#[command(about = "Changelog service backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database if needed and apply migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    telemetry::init(&config.telemetry);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(environment = %config.environment, "Starting LogStream Core");
            info!("HTTP server listening on {}", config.http_addr());
            server::run(config).await
        }
        Commands::Migrate => migration::run_migrations(&config).await,
    }
}
