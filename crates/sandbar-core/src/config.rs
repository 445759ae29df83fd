//! Server configuration.
//!
//! Values come from the embedding caller (tests build this directly) or
//! from environment variables via [`ServerConfig::from_env`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// A bucket to create at startup, optionally with preloaded configuration
/// documents (CORS and/or website XML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketPreset {
    /// The bucket name.
    pub name: String,
    /// Raw configuration XML documents applied to the bucket. Each must be
    /// a valid CORS or website configuration; invalid documents abort
    /// startup.
    #[serde(default)]
    pub configs: Vec<Vec<u8>>,
}

/// Sandbar server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// TCP port; 0 binds an ephemeral port.
    #[builder(default = 4568)]
    pub port: u16,

    /// Bind address.
    #[builder(default = String::from("localhost"))]
    pub address: String,

    /// Host suffix for virtual-hosted-style addressing.
    #[builder(default = String::from("s3.amazonaws.com"))]
    pub service_endpoint: String,

    /// On-disk root for persistence; `None` keeps everything in memory.
    #[builder(default)]
    pub directory: Option<PathBuf>,

    /// Suppress log output.
    #[builder(default = false)]
    pub silent: bool,

    /// Delete all stored state on shutdown.
    #[builder(default = false)]
    pub reset_on_close: bool,

    /// Buckets (and their configurations) created at startup.
    #[builder(default)]
    pub configure_buckets: Vec<BucketPreset>,

    /// Accept requests whose signature digest does not match.
    #[builder(default = false)]
    pub allow_mismatched_signatures: bool,

    /// Enable virtual-hosted-style and CNAME bucket addressing.
    #[builder(default = true)]
    pub vhost_buckets: bool,

    /// The known access key ID.
    #[builder(default = String::from("S3RVER"))]
    pub access_key_id: String,

    /// The known secret access key.
    #[builder(default = String::from("S3RVER"))]
    pub secret_access_key: String,

    /// The region reported by `GetBucketLocation` and used in presigned
    /// credential scopes.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Load configuration from `SANDBAR_*` environment variables, falling
    /// back to defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SANDBAR_PORT` | `4568` |
    /// | `SANDBAR_ADDRESS` | `localhost` |
    /// | `SANDBAR_SERVICE_ENDPOINT` | `s3.amazonaws.com` |
    /// | `SANDBAR_DIRECTORY` | *(in-memory)* |
    /// | `SANDBAR_SILENT` | `false` |
    /// | `SANDBAR_RESET_ON_CLOSE` | `false` |
    /// | `SANDBAR_ALLOW_MISMATCHED_SIGNATURES` | `false` |
    /// | `SANDBAR_VHOST_BUCKETS` | `true` |
    /// | `SANDBAR_ACCESS_KEY_ID` | `S3RVER` |
    /// | `SANDBAR_SECRET_ACCESS_KEY` | `S3RVER` |
    /// | `SANDBAR_REGION` | `us-east-1` |
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parsed("SANDBAR_PORT", defaults.port),
            address: env_string("SANDBAR_ADDRESS", defaults.address),
            service_endpoint: env_string("SANDBAR_SERVICE_ENDPOINT", defaults.service_endpoint),
            directory: std::env::var("SANDBAR_DIRECTORY").ok().map(PathBuf::from),
            silent: env_parsed("SANDBAR_SILENT", defaults.silent),
            reset_on_close: env_parsed("SANDBAR_RESET_ON_CLOSE", defaults.reset_on_close),
            configure_buckets: Vec::new(),
            allow_mismatched_signatures: env_parsed(
                "SANDBAR_ALLOW_MISMATCHED_SIGNATURES",
                defaults.allow_mismatched_signatures,
            ),
            vhost_buckets: env_parsed("SANDBAR_VHOST_BUCKETS", defaults.vhost_buckets),
            access_key_id: env_string("SANDBAR_ACCESS_KEY_ID", defaults.access_key_id),
            secret_access_key: env_string("SANDBAR_SECRET_ACCESS_KEY", defaults.secret_access_key),
            region: env_string("SANDBAR_REGION", defaults.region),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
