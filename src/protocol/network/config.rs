use crate::protocol::network::{ApiClient, ApiError, ApiResult};
use crate::store::TokenStore;
use reqwest::ClientBuilder;
use std::time::Duration;
use url::Url;

pub const REFRESH_SUFFIX: &str = "/api/auth/refresh";
pub const LOGOUT_SUFFIX: &str = "/api/auth/logout";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub refresh_timeout: Duration,
    pub user_agent: String,
    pub refresh_endpoint: String,
    pub logout_endpoint: String,
}

impl ClientConfig {
    /// Resolves `endpoint` against the base URL; absolute URLs pass through.
    pub fn endpoint_url(&self, endpoint: &str) -> ApiResult<Url> {
        let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| ApiError::Configuration(format!("bad endpoint {raw}: {e}")))
    }
}

#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    tokens: Option<TokenStore>,
    request_timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
    user_agent: Option<String>,
    refresh_endpoint: Option<String>,
    logout_endpoint: Option<String>,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Token storage shared with the rest of the application. Defaults to an
    /// in-memory store.
    pub fn token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Upper bound on a single refresh exchange.
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.refresh_endpoint = Some(endpoint.into());
        self
    }

    pub fn logout_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.logout_endpoint = Some(endpoint.into());
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::Configuration("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ApiError::Configuration(format!("bad base_url {base_url}: {e}")))?;

        let config = ClientConfig {
            base_url,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            refresh_timeout: self.refresh_timeout.unwrap_or(DEFAULT_REFRESH_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| format!("shrinkurl-client/{}", env!("CARGO_PKG_VERSION"))),
            refresh_endpoint: self.refresh_endpoint.unwrap_or_else(|| REFRESH_SUFFIX.to_string()),
            logout_endpoint: self.logout_endpoint.unwrap_or_else(|| LOGOUT_SUFFIX.to_string()),
        };

        let http = ClientBuilder::new()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(ApiClient::from_parts(
            http,
            config,
            self.tokens.unwrap_or_else(TokenStore::in_memory),
        ))
    }
}
