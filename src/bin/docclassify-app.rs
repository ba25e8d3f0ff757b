use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;

use docclassify::analysis::{AnalysisConfig, AnalysisService, HttpAnalysisService};
use docclassify::app::registration_store::{LoggingRegistrationStore, RegistrationStore};
use docclassify::app::{AppState, max_upload_bytes_from_env, router};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Analysis service base URL (overrides DOCCLASSIFY_ANALYSIS_URL).
    #[arg(long)]
    analysis_url: Option<String>,

    /// Categories the analysis must include, unless a request names its own.
    #[arg(long)]
    classification_prompt: Option<String>,

    /// Per-request upstream timeout; 0 waits forever.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Body size cap for `/api/ocr` (overrides DOCCLASSIFY_MAX_UPLOAD_BYTES);
    /// 0 disables it.
    #[arg(long)]
    max_upload_bytes: Option<usize>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    docclassify::logging::init_with_default("info,tower_http=debug")?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting docclassify-app");

    let mut config = AnalysisConfig::from_env().context("load analysis config")?;
    if let Some(base_url) = args.analysis_url {
        config.base_url = base_url;
    }
    if let Some(prompt) = args.classification_prompt {
        config.classification_prompt = Some(prompt);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let max_upload_bytes = match args.max_upload_bytes {
        Some(bytes) => (bytes > 0).then_some(bytes),
        None => max_upload_bytes_from_env().context("load upload limit")?,
    };

    let analysis: Arc<dyn AnalysisService> = Arc::new(HttpAnalysisService::new(&config)?);
    let registrations: Arc<dyn RegistrationStore> = Arc::new(LoggingRegistrationStore);
    tracing::info!(
        base_url = %config.base_url,
        timeout = ?config.timeout,
        max_upload_bytes = ?max_upload_bytes,
        "using analysis service"
    );

    let app = router(AppState {
        analysis,
        analysis_config: Arc::new(config),
        registrations,
        max_upload_bytes,
    });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
