use clap::Parser;
use poly_signal::cli::{Cli, Commands};
use poly_signal::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });
    config.apply_env()?;
    config.validate()?;

    // Initialize telemetry
    poly_signal::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Signal(args) => {
            tracing::info!(slug = %args.slug, "signal_requested");
            args.execute(&config).await?;
        }
        Commands::Signal15m(args) => {
            tracing::info!(slug = %args.slug, "signal_15m_requested");
            args.execute(&config).await?;
        }
        Commands::Sources(args) => {
            args.execute(&config).await?;
        }
        Commands::Stats(args) => {
            args.execute().await?;
        }
        Commands::Config => {
            let mut shown = config.clone();
            if shown.sources.fmp_api_key.is_some() {
                shown.sources.fmp_api_key = Some("***".to_string());
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}
