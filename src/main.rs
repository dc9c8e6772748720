use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use event_vibe::app::event_pipeline::EventPipeline;
use event_vibe::app::ports::{AiGatewayPort, PageCapturePort};
use event_vibe::config::Config;
use event_vibe::constants::DEFAULT_TEMPLATE_COUNT;
use event_vibe::infra::ai_backend::AiClient;
use event_vibe::infra::browser_session::{BrowserSession, CaptureOptions};
use event_vibe::infra::chrome::ChromeLauncher;
use event_vibe::logging;
use event_vibe::metrics::init_metrics;
use event_vibe::types::BackgroundStyle;

#[derive(Parser)]
#[command(name = "event_vibe")]
#[command(about = "Extract an event's visual identity and generate poster templates")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an event page into structured event data
    Parse {
        /// Event page URL
        #[arg(long)]
        url: String,
    },
    /// Parse an event page, then generate poster templates for it
    Templates {
        /// Event page URL
        #[arg(long)]
        url: String,
        /// Number of templates to generate (at most 3 offline)
        #[arg(long, default_value_t = DEFAULT_TEMPLATE_COUNT)]
        count: usize,
    },
    /// Parse an event page, then generate background artwork for it
    Background {
        /// Event page URL
        #[arg(long)]
        url: String,
        /// Artwork style: modern, minimal or bold
        #[arg(long, default_value = "modern")]
        style: BackgroundStyle,
    },
}

async fn run(command: Commands, pipeline: &EventPipeline) -> anyhow::Result<()> {
    match command {
        Commands::Parse { url } => {
            let event = pipeline.parse_event_from_url(&url).await?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Commands::Templates { url, count } => {
            let event = pipeline.parse_event_from_url(&url).await?;
            let templates = pipeline.generate_templates(&event, count).await?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        Commands::Background { url, style } => {
            let event = pipeline.parse_event_from_url(&url).await?;
            let image = pipeline.generate_background_image(&event, style).await;
            println!("{}", image);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    if let Some(addr) = config.metrics_addr.as_deref() {
        init_metrics(addr);
    }

    let session = Arc::new(BrowserSession::new(
        ChromeLauncher::new(config.browser.chrome_path.clone()),
        CaptureOptions::from(&config.browser),
    ));
    let gateway = AiClient::from_config(&config.ai)?
        .map(|client| Arc::new(client) as Arc<dyn AiGatewayPort>);

    let capture: Arc<dyn PageCapturePort> = session.clone();
    let pipeline = EventPipeline::new(capture, gateway);
    info!(ai = pipeline.has_ai(), "Pipeline ready");

    let result = run(cli.command, &pipeline).await;
    session.teardown().await;

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
    }
    result
}
