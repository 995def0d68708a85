//! stickerd – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Ensure an ffmpeg binary is available (downloads one if missing).
//! 4. Construct the file-store client, animation engine, and dispatcher.
//! 5. Start the gRPC server with graceful shutdown.

mod config;
mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use stickerd_core::Dispatcher;
use stickerd_core::filestore::TelegramFileStore;
use stickerd_core::lottie::AnimationEngine;
use stickerd_proto::v1::sticker_converter_service_server::StickerConverterServiceServer;

use crate::config::Config;
use crate::service::ConverterService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env()?;

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: STICKERD_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "stickerd starting");

    // ── 3. ffmpeg ──────────────────────────────────────────────────────────────
    tokio::task::spawn_blocking(ffmpeg_sidecar::download::auto_download)
        .await?
        .map_err(|e| anyhow::anyhow!("ffmpeg unavailable: {e}"))?;
    info!("ffmpeg ready");

    // ── 4. Conversion pipeline ─────────────────────────────────────────────────
    let store = Arc::new(TelegramFileStore::new(
        cfg.telegram_api.clone(),
        cfg.telegram_token.clone(),
    ));
    let engine = animation_engine();
    let dispatcher = Arc::new(Dispatcher::new(engine));
    let service = ConverterService::new(store, dispatcher);

    // ── 5. gRPC server with graceful shutdown ──────────────────────────────────
    let addr: SocketAddr = cfg.bind_address.parse()?;
    info!(%addr, "gRPC server listening");
    tonic::transport::Server::builder()
        .add_service(StickerConverterServiceServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("stickerd stopped");
    Ok(())
}

#[cfg(feature = "rlottie")]
fn animation_engine() -> Arc<dyn AnimationEngine> {
    Arc::new(stickerd_core::lottie::RlottieEngine)
}

#[cfg(not(feature = "rlottie"))]
fn animation_engine() -> Arc<dyn AnimationEngine> {
    warn!("built without rlottie; animated sticker conversion is disabled");
    Arc::new(stickerd_core::lottie::DisabledEngine)
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
