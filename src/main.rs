use amazon_pay_gateway::cli::{self, Cli, Commands, DbCommands};
use amazon_pay_gateway::config::{Config, LogFormat};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        region = %config.gateway.region,
        sandbox = config.gateway.sandbox,
        "Amazon Pay gateway configured"
    );

    match args.command {
        Commands::Order(command) => cli::handle_order(&config, command).await,
        Commands::Details(command) => cli::handle_details(&config, command).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config).await,
    }
}
