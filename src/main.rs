use clap::Parser;
use ticker_feed::cli::{Cli, Commands};
use ticker_feed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = ticker_feed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!("Starting ticker watch");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Feed: {} {}", config.feed.url, config.feed.symbol);
            println!(
                "  Reconnect: max {} attempts, {}ms..{}ms",
                config.feed.max_reconnect_attempts,
                config.feed.initial_delay_ms,
                config.feed.max_delay_ms
            );
            println!("  History: {} samples", config.feed.history_capacity);
            println!(
                "  Logging: {} ({:?})",
                config.telemetry.log_level, config.telemetry.log_format
            );
        }
    }

    Ok(())
}
