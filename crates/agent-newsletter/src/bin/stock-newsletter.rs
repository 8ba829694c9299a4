//! Stock newsletter CLI
//!
//! # Usage
//!
//! ```bash
//! # Credentials and settings come from the environment or a .env file
//! export OPENAI_API_KEY="sk-..."
//!
//! # Serve the research form on http://127.0.0.1:8501
//! cargo run --bin stock-newsletter -- serve
//!
//! # Research one ticker and print the newsletter
//! cargo run --bin stock-newsletter -- research AAPL
//! ```

use agent_newsletter::web::{self, AppState};
use agent_newsletter::{NewsletterConfig, NewsletterPipeline};
use agent_utils::{LogFormat, init_tracing_with, load_env_file};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "stock-newsletter", version)]
#[command(about = "Research a stock and write a newsletter about it", long_about = None)]
struct Cli {
    /// .env file to load before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Log output: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the research web form
    Serve {
        /// Address to listen on, overrides NEWSLETTER_BIND
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Research one ticker and print the newsletter
    Research {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Print the whole run as JSON instead of the markdown
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = load_env_file(cli.env_file.as_deref())?;
    init_tracing_with(cli.log_format);
    if !loaded {
        info!("No .env file loaded, using the process environment");
    }

    let mut config = NewsletterConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let addr = config.bind;
            let state = AppState::new(Arc::new(config))?;
            web::serve(state, addr).await
        }
        Command::Research { ticker, json } => {
            let pipeline = NewsletterPipeline::from_config(Arc::new(config))?;

            let run = match pipeline.research(&ticker).await {
                Ok(run) => run,
                Err(err) => {
                    error!(category = err.category(), error = %err, "Research failed");
                    anyhow::bail!("{}", err.user_message());
                }
            };

            for degradation in &run.degradations {
                warn!(stage = degradation.stage(), "{degradation}");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                println!("{}", run.markdown());
            }
            Ok(())
        }
    }
}
