use crate::config::Config;
use crate::model::Credentials;
use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// HTTP adapter that logs in to webDiplomacy and pulls the home page, which
/// lists every board the user is a member of. No retries; a failed fetch
/// fails the whole run.
#[derive(Clone)]
pub struct DipClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for DipClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DipClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DipClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url).context("invalid base_url in configuration")?;
        Self::with_base_url(cfg, base_url)
    }

    pub fn with_base_url(cfg: &Config, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// The login form doubles as the page request: posting the credentials
    /// to `index.php` returns the logged-in home page.
    pub fn build_login_request(&self, creds: &Credentials) -> Result<reqwest::Request> {
        let endpoint = self.base_url.join("index.php").context("invalid base URL")?;
        self.http
            .post(endpoint)
            .form(&[
                ("loginuser", creds.login_user.as_str()),
                ("loginpass", creds.login_pass.as_str()),
            ])
            .build()
            .context("failed to build login request")
    }

    /// Log in with the stored credentials and return the home page HTML.
    pub async fn fetch_home(&self, creds: &Credentials) -> Result<String> {
        let request = self.build_login_request(creds)?;
        debug!(url = %request.url(), "fetching webDiplomacy home page");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach webDiplomacy")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("webDiplomacy error {}: {}", status, body));
        }

        res.text()
            .await
            .context("failed to read webDiplomacy response")
    }
}
