use crate::domain::{Page, TokenPair};
use crate::protocol::network::refresh::{exchange_refresh_token, RefreshCoordinator};
use crate::protocol::network::{ApiClientBuilder, ApiError, ApiResult, ClientConfig};
use crate::store::TokenStore;
use futures_util::FutureExt;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;

const REQUESTED_WITH: &str = "x-requested-with";

/// Method, body and extra headers of one API call.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(Method::PUT).body(body)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header that overrides the JSON defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

struct Inner {
    http: Client,
    config: ClientConfig,
    tokens: TokenStore,
    refresh: RefreshCoordinator,
}

/// Authenticated client for the URL shortener API.
///
/// Cheap to clone; clones share the token store and the in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> ApiResult<Self> {
        Self::builder().base_url(base_url).token_store(tokens).build()
    }

    pub(crate) fn from_parts(http: Client, config: ClientConfig, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                tokens,
                refresh: RefreshCoordinator::default(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Stores the token pair handed out by a login, starting a new session.
    pub fn sign_in(&self, pair: &TokenPair) {
        self.inner.refresh.reset();
        self.inner.tokens.set_pair(pair);
    }

    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResult<Value> {
        let url = self.inner.config.endpoint_url(endpoint)?;
        self.execute(url, options).await
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let value = self.request(endpoint, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `GET endpoint?page=..&size=..` decoded as one page of `T`.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<T>> {
        let mut url = self.inner.config.endpoint_url(endpoint)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        let value = self.execute(url, RequestOptions::get()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Best-effort server logout; local tokens are cleared regardless.
    pub async fn logout(&self) {
        let bearer = self.inner.tokens.usable_access_token();
        match self.inner.config.endpoint_url(&self.inner.config.logout_endpoint) {
            Ok(url) => match self
                .send(&url, &RequestOptions::new(Method::POST), bearer.as_deref())
                .await
            {
                Ok(response) => debug!("Logout answered {}", response.status()),
                Err(e) => warn!("Logout request failed: {}", e),
            },
            Err(e) => warn!("Logout skipped: {}", e),
        }
        self.inner.refresh.reset();
        self.inner.tokens.clear();
    }

    pub(crate) async fn execute(&self, url: Url, options: RequestOptions) -> ApiResult<Value> {
        let bearer = self.inner.tokens.usable_access_token();
        let response = self.send(&url, &options, bearer.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_json(response).await;
        }

        debug!("{} {} unauthorized, renewing access token", options.method, url.path());
        let renewed = self.renew_access_token(bearer.as_deref()).await?;
        let retried = self.send(&url, &options, Some(renewed.as_str())).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} still unauthorized after refresh", options.method, url.path());
            return Err(ApiError::AuthExpired(
                "request rejected again after token refresh".into(),
            ));
        }
        read_json(retried).await
    }

    /// A token to retry with after `rejected` got a 401.
    ///
    /// If another caller already replaced the rejected token, that token is
    /// reused; otherwise this joins or starts the shared refresh.
    async fn renew_access_token(&self, rejected: Option<&str>) -> ApiResult<String> {
        if let Some(current) = self.inner.tokens.usable_access_token() {
            if rejected != Some(current.as_str()) {
                debug!("Access token already renewed");
                return Ok(current);
            }
        }

        let inner = &self.inner;
        let url = inner.config.endpoint_url(&inner.config.refresh_endpoint)?;
        let token = inner
            .refresh
            .refresh(|| {
                exchange_refresh_token(
                    inner.http.clone(),
                    inner.tokens.clone(),
                    url,
                    inner.config.refresh_timeout,
                )
                .boxed()
            })
            .await?;
        Ok(token)
    }

    async fn send(
        &self,
        url: &Url,
        options: &RequestOptions,
        bearer: Option<&str>,
    ) -> ApiResult<Response> {
        let mut headers = default_headers();
        headers.extend(options.headers.clone());
        if let Some(token) = bearer {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Configuration(format!("unusable access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        trace!(
            "{} {} (bearer: {})",
            options.method,
            url.path(),
            bearer.is_some()
        );

        let mut request = self
            .inner
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        trace!("{} {} -> {}", options.method, url.path(), response.status());
        Ok(response)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    headers
}

async fn read_json(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(ApiError::from_status(
            status,
            String::from_utf8_lossy(&body).into_owned(),
        ));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}
