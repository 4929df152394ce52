//! cue-web - cumulative top-scorers service
//!
//! `cue-web serve` runs the upload/export web service (the default when no
//! subcommand is given). `cue-web cumulate` uploads a standings file and a
//! round workbook to a running service and saves the exported document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cue_common::config::{ConfigOverrides, ServiceConfig};
use cue_web::client::CueClient;
use cue_web::models::SlotId;
use cue_web::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cue-web")]
#[command(about = "Cumulative top-scorers service")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web service
    Serve(ServeArgs),
    /// Upload both files to a running service and save the export
    Cumulate(CumulateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "CUE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CUE_PORT")]
    port: Option<u16>,

    /// Largest accepted upload body in bytes
    #[arg(long, env = "CUE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Seconds before an idle session is dropped
    #[arg(long, env = "CUE_SESSION_TTL_SECS")]
    session_ttl_secs: Option<u64>,

    /// Log filter, e.g. `info` or `cue_web=debug`
    #[arg(long, env = "CUE_LOG_LEVEL")]
    log_level: Option<String>,

    /// TOML config file (defaults to `CUE_CONFIG`, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ServeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
            session_ttl_secs: self.session_ttl_secs,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct CumulateArgs {
    /// Base URL of the running service
    #[arg(long, env = "CUE_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Standings up to the previous round (.txt, .docx, .doc)
    #[arg(long)]
    bron: PathBuf,

    /// Results of the current round (.xlsx, .xls)
    #[arg(long)]
    uitslagen: PathBuf,

    /// Directory to write the exported document to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Cumulate(args)) => cumulate(args).await,
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    // Config warnings are emitted before the configured filter exists
    let bootstrap = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || {
        ServiceConfig::resolve(&args.overrides(), args.config.as_deref())
    });

    init_tracing(&config.log_level);

    info!(
        "Starting cue-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        max_upload_bytes = config.max_upload_bytes,
        session_ttl_secs = config.session_ttl_secs,
        "Configuration resolved"
    );

    let address = config.bind_address();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("cue-web listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

async fn cumulate(args: CumulateArgs) -> Result<()> {
    init_tracing("info");

    let mut client = CueClient::new(&args.server)?;

    for (slot, path) in [(SlotId::Bron, &args.bron), (SlotId::Uitslagen, &args.uitslagen)] {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        client
            .upload(slot, &upload_name(path), bytes)
            .await
            .with_context(|| format!("Upload of {} into slot {} failed", path.display(), slot))?;
    }

    let download = client.export().await.context("Export failed")?;

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let target = args.out_dir.join(&download.filename);
    tokio::fs::write(&target, &download.bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!("Saved {}", target.display());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
