// Builds the HTTP client used for GitHub API calls.

use crate::constants;
use anyhow::Result;
use reqwest::Client;
use runner_sdk::{RunnerPackage, StringUtil};

/// Creates properly configured HTTP clients.
pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Create a new `reqwest::Client`.
    ///
    /// - `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` are picked up by `reqwest`
    ///   itself.
    /// - If `GITHUB_ACTIONS_RUNNER_TLS_NO_VERIFY` is truthy, TLS certificate
    ///   verification is disabled (dangerous!).
    /// - No request timeout is set; the hosting job enforces its own.
    pub fn create_client() -> Result<Client> {
        let mut builder = Client::builder().user_agent(RunnerPackage::user_agent());

        if Self::tls_verification_disabled() {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }

    fn tls_verification_disabled() -> bool {
        std::env::var(constants::variables::TLS_NO_VERIFY)
            .ok()
            .and_then(|v| StringUtil::convert_to_bool(&v))
            .unwrap_or(false)
    }
}
