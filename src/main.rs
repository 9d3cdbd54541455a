//! Language Insight
//!
//! Serves the analysis page and JSON API, or runs a single analysis from the
//! command line.

use clap::{Parser, Subcommand};
use language_insight::{
    analysis::{Analyzer, AnalyzerOptions},
    client,
    config::Config,
    web::{self, AnalyzeResponse, AppState},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "language-insight")]
#[command(about = "Sentiment, key phrase and language analysis over a cloud language API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Analyze text once and print the JSON result
    Analyze {
        /// Text to analyze
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Analyze { text } => analyze_once(config, &text).await,
    }
}

/// Build the analyzer around one shared client
fn build_analyzer(config: &Config) -> anyhow::Result<Analyzer> {
    let client = client::from_config(&config.language)?;
    tracing::info!("Language service endpoint: {}", client.endpoint());
    Ok(Analyzer::new(Arc::new(client), AnalyzerOptions::from_config(config)))
}

async fn serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let analyzer = build_analyzer(&config)?;
    let state = AppState::new(analyzer)?;
    let bind_address = bind.unwrap_or_else(|| config.server.bind_address.clone());

    web::serve(state, &bind_address).await
}

async fn analyze_once(config: Config, text: &str) -> anyhow::Result<()> {
    let analyzer = build_analyzer(&config)?;
    let result = analyzer.analyze(text).await?;

    println!("{}", serde_json::to_string_pretty(&AnalyzeResponse::from(&result))?);
    Ok(())
}
