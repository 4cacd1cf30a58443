//! Shared `reqwest` client construction.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Install the process-wide rustls crypto provider once.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate got there first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Maximum time between two reads of a response body. Zero disables it.
    pub read_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
        }
    }
}

/// Build the client shared by the manifest fetches and the segment downloads.
///
/// Only per-read timeouts are applied; a whole-request timeout would cut off
/// large segments on slow links.
pub fn build_client(config: &HttpClientConfig) -> reqwest::Result<Client> {
    install_rustls_provider();

    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout);

    if config.read_timeout > Duration::ZERO {
        builder = builder.read_timeout(config.read_timeout);
    }

    builder.build()
}
