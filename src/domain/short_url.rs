use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub original_url: String,
}

/// A shortened URL as listed on the dashboard or returned by `shorten`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub click_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

impl ShortUrl {
    /// Absolute short link, falling back to `base` + code when the backend
    /// only sent the code.
    pub fn link(&self, base: &str) -> String {
        match &self.short_url {
            Some(url) if url.starts_with("http") => url.clone(),
            Some(path) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
            None => format!("{}/{}", base.trim_end_matches('/'), self.short_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_dashboard_entry() {
        let url: ShortUrl = serde_json::from_str(
            r#"{
                "id": 7,
                "originalUrl": "https://example.com/a/long/path",
                "shortCode": "abc123",
                "userId": 3,
                "clickCount": 12,
                "createdAt": "2025-03-01T10:15:30.123",
                "expiresAt": null,
                "isActive": true
            }"#,
        )
        .unwrap();

        assert_eq!(url.id, 7);
        assert_eq!(url.click_count, Some(12));
        assert!(url.created_at.is_some());
        assert!(url.expires_at.is_none());
    }

    #[test]
    fn link_prefers_absolute_short_url() {
        let mut url = ShortUrl {
            id: 1,
            original_url: "https://example.com".to_string(),
            short_code: "xyz".to_string(),
            short_url: None,
            click_count: None,
            created_at: None,
            expires_at: None,
        };
        assert_eq!(url.link("https://sh.rt/"), "https://sh.rt/xyz");

        url.short_url = Some("/s/xyz".to_string());
        assert_eq!(url.link("https://sh.rt"), "https://sh.rt/s/xyz");

        url.short_url = Some("https://other.host/xyz".to_string());
        assert_eq!(url.link("https://sh.rt"), "https://other.host/xyz");
    }
}
