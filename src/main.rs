use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline_controller::{config::Config, services::PipelineService, web::WebServer};

#[derive(Parser)]
#[command(name = "pipeline-controller")]
#[command(version)]
#[command(about = "A minimal build/test/deploy pipeline controller with live status push")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("pipeline_controller={},tower_http=trace", cli.log_level)
    } else {
        format!("pipeline_controller={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting pipeline controller v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let pipeline_service = PipelineService::from_config(&config);
    info!(
        on_duplicate = ?config.registry.on_duplicate,
        stage_timeout_secs = ?config.execution.stage_timeout_secs,
        "Pipeline service initialized"
    );

    let web_server = WebServer::new(&config, pipeline_service)?;
    info!(
        "Pipeline controller listening on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve(shutdown_signal()).await?;

    info!("Pipeline controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
