mod analyze;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hotelcheck-cli")]
#[command(about = "Flag hotel reviews that do not match the hotel they describe")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List hotels in the catalog
    Hotels,
    /// Score every review of a hotel against its parameters
    Analyze {
        hotel_id: String,

        /// Override `SIMILARITY_THRESHOLD` for this run
        #[arg(long, value_parser = analyze::parse_threshold)]
        threshold: Option<f32>,

        /// Print the analysis as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Score ad-hoc review text against a hotel
    Review {
        hotel_id: String,
        text: String,

        /// Override `SIMILARITY_THRESHOLD` for this run
        #[arg(long, value_parser = analyze::parse_threshold)]
        threshold: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = hotelcheck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Hotels) => analyze::run_hotels(&config)?,
        Some(Commands::Analyze {
            hotel_id,
            threshold,
            json,
        }) => analyze::run_analyze(&config, &hotel_id, threshold, json).await?,
        Some(Commands::Review {
            hotel_id,
            text,
            threshold,
        }) => analyze::run_review(&config, &hotel_id, &text, threshold).await?,
        None => println!("hotelcheck-cli: run with --help for available commands"),
    }

    Ok(())
}
