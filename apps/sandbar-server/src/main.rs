//! Sandbar - a local, wire-compatible S3 server for development and
//! testing.
//!
//! # Usage
//!
//! ```text
//! SANDBAR_PORT=4568 SANDBAR_DIRECTORY=/tmp/sandbar sandbar-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SANDBAR_PORT` | `4568` | TCP port (0 = ephemeral) |
//! | `SANDBAR_ADDRESS` | `localhost` | Bind address |
//! | `SANDBAR_SERVICE_ENDPOINT` | `s3.amazonaws.com` | Vhost host suffix |
//! | `SANDBAR_DIRECTORY` | *(in-memory)* | On-disk persistence root |
//! | `SANDBAR_SILENT` | `false` | Suppress log output |
//! | `SANDBAR_RESET_ON_CLOSE` | `false` | Delete all state on shutdown |
//! | `SANDBAR_ALLOW_MISMATCHED_SIGNATURES` | `false` | Tolerate bad digests |
//! | `SANDBAR_VHOST_BUCKETS` | `true` | Enable vhost/CNAME addressing |
//! | `SANDBAR_ACCESS_KEY_ID` | `S3RVER` | Known access key |
//! | `SANDBAR_SECRET_ACCESS_KEY` | `S3RVER` | Known secret key |
//! | `SANDBAR_REGION` | `us-east-1` | Reported region |
//! | `RUST_LOG` | *(unset)* | Tracing filter (overrides defaults) |
//!
//! Exit code is zero on a clean shutdown and non-zero when startup
//! validation fails (bad preconfigured XML, bind error).

use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sandbar_core::events::EventBus;
use sandbar_core::state::ServiceState;
use sandbar_core::store::FsStore;
use sandbar_core::{SandbarS3, ServerConfig};
use sandbar_http::{S3HttpConfig, S3HttpService};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `silent` selects between `info`
/// and everything off.
fn init_tracing(silent: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if silent {
        EnvFilter::try_new("off").context("invalid log filter")?
    } else {
        EnvFilter::try_new("info").context("invalid log filter")?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the provider: state (optionally disk-backed), events, presets.
fn build_provider(config: &ServerConfig) -> Result<SandbarS3> {
    let state = match &config.directory {
        Some(directory) => {
            let store = FsStore::open(directory)
                .with_context(|| format!("cannot open store directory {}", directory.display()))?;
            ServiceState::with_store(store)
                .map_err(|e| anyhow::anyhow!("failed to load persisted state: {e}"))?
        }
        None => ServiceState::new(),
    };

    let provider = SandbarS3::new(Arc::new(state), Arc::new(EventBus::new()), config.clone());
    provider
        .apply_bucket_presets()
        .map_err(|e| anyhow::anyhow!("invalid bucket preconfiguration: {e}"))?;
    Ok(provider)
}

/// Accept connections until ctrl-c, then drain gracefully.
async fn serve(listener: TcpListener, service: S3HttpService<SandbarS3>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    init_tracing(config.silent)?;

    info!(
        port = config.port,
        address = %config.address,
        service_endpoint = %config.service_endpoint,
        directory = ?config.directory,
        vhost_buckets = config.vhost_buckets,
        "starting Sandbar S3 server",
    );

    let provider = build_provider(&config)?;
    let state = Arc::clone(&provider.state);

    let http_config = S3HttpConfig {
        service_endpoint: config.service_endpoint.clone(),
        vhost_buckets: config.vhost_buckets,
        base_path: None,
        access_key_id: config.access_key_id.clone(),
        secret_access_key: config.secret_access_key.clone(),
        allow_mismatched_signatures: config.allow_mismatched_signatures,
    };
    let service = S3HttpService::new(Arc::new(provider), http_config);

    let listener = TcpListener::bind((config.address.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind to {}:{}", config.address, config.port))?;
    let local_addr = listener.local_addr().context("no local address")?;

    info!(%local_addr, "listening for connections");

    serve(listener, service).await?;

    if config.reset_on_close {
        info!("reset-on-close: tearing down stored state");
        state.reset();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_provider_without_directory() {
        let config = ServerConfig::default();
        let provider = build_provider(&config).expect("provider");
        assert!(provider.state.list_buckets().is_empty());
    }

    #[test]
    fn test_should_fail_startup_on_invalid_preset() {
        let config = ServerConfig::builder()
            .configure_buckets(vec![sandbar_core::config::BucketPreset {
                name: "preset".to_owned(),
                configs: vec![b"<NotAConfig/>".to_vec()],
            }])
            .build();
        assert!(build_provider(&config).is_err());
    }
}
