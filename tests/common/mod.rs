#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::json;
use shrinkurl_client::protocol::network::ApiClient;
use shrinkurl_client::store::TokenStore;
use std::time::Duration;

/// An unsigned JWT-shaped token; `label` keeps tokens distinguishable.
pub fn token(label: &str, expires_in: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": format!("{label}@example.com"),
        "jti": label,
        "exp": Utc::now().timestamp() + expires_in,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig-{label}")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn client(base_url: &str, tokens: &TokenStore) -> ApiClient {
    ApiClient::builder()
        .base_url(base_url)
        .token_store(tokens.clone())
        .refresh_timeout(Duration::from_millis(500))
        .build()
        .unwrap()
}
