//! URL shortener endpoints

use crate::domain::{Page, ShortUrl, ShortenRequest};
use crate::protocol::network::{ApiClient, ApiResult, RequestOptions};
use serde_json::Value;

pub const URLS_PAGINATED_SUFFIX: &str = "/api/urls/paginated";
pub const SHORTEN_SUFFIX: &str = "/api/urls/shorten";
pub const USAGE_SUFFIX: &str = "/api/user/usage";

impl ApiClient {
    /// Shorten `original_url`, optionally under a caller-chosen code
    pub async fn shorten(
        &self,
        original_url: impl Into<String>,
        custom_code: Option<&str>,
    ) -> ApiResult<ShortUrl> {
        let mut url = self.config().endpoint_url(SHORTEN_SUFFIX)?;
        if let Some(code) = custom_code {
            url.query_pairs_mut().append_pair("customCode", code);
        }
        let body = serde_json::to_value(ShortenRequest {
            original_url: original_url.into(),
        })?;

        let value = self.execute(url, RequestOptions::post(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// One page of the signed-in user's URLs
    pub async fn urls_page(&self, page: u32, size: u32) -> ApiResult<Page<ShortUrl>> {
        self.fetch_page(URLS_PAGINATED_SUFFIX, page, size).await
    }

    /// Plan usage statistics, passed through as raw JSON
    pub async fn usage(&self) -> ApiResult<Value> {
        self.request(USAGE_SUFFIX, RequestOptions::get()).await
    }
}
