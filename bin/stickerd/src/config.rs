//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for stickerd.
///
/// Only the Telegram bot token is mandatory; everything else has a default
/// so the server works out-of-the-box.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:50051"`).
    pub bind_address: String,

    /// Telegram Bot API token used to resolve and download sticker files.
    pub telegram_token: String,

    /// Base URL of the Telegram Bot API (default: `"https://api.telegram.org"`).
    /// Overridable to point at a local Bot API server.
    pub telegram_api: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,h2=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables.
    ///
    /// Fails when `STICKERD_TELEGRAM_TOKEN` is unset: the service cannot
    /// resolve any sticker without a file-store credential.
    pub fn from_env() -> anyhow::Result<Self> {
        let telegram_token = std::env::var("STICKERD_TELEGRAM_TOKEN")
            .map_err(|_| anyhow::anyhow!("STICKERD_TELEGRAM_TOKEN must be set"))?;
        Ok(Self {
            bind_address: env_or("STICKERD_BIND", "0.0.0.0:50051"),
            telegram_token,
            telegram_api: env_or("STICKERD_TELEGRAM_API", "https://api.telegram.org"),
            log_level: env_or("STICKERD_LOG", "info"),
            log_json: std::env::var("STICKERD_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
