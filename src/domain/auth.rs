use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a successful login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub access_token: String,
    pub refresh_token: String,
}

impl From<AuthResponse> for TokenPair {
    fn from(response: AuthResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `refresh_token` is only present when the backend rotated it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),
    #[error("claims segment is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("claims segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing or non-numeric `exp` claim")]
    Expiry,
}

/// Decoded, unverified view of an access token's payload.
///
/// Never stored; recomputed from the token whenever it is needed.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenClaims {
    pub expires_at: i64,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub user_id: Option<i64>,
    pub roles: Vec<String>,
}

impl TokenClaims {
    pub fn decode(token: &str) -> Result<Self, TokenDecodeError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenDecodeError::SegmentCount(segments.len()));
        }

        let payload = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;
        let claims: Map<String, Value> = serde_json::from_slice(&payload)?;
        let expires_at = claims
            .get("exp")
            .and_then(epoch_seconds)
            .ok_or(TokenDecodeError::Expiry)?;

        Ok(Self {
            expires_at,
            subject: string_claim(&claims, "sub"),
            email: string_claim(&claims, "email"),
            name: string_claim(&claims, "name"),
            user_id: claims.get("userId").and_then(Value::as_i64),
            roles: claims
                .get("roles")
                .and_then(Value::as_array)
                .map(|roles| {
                    roles
                        .iter()
                        .filter_map(|role| role.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

/// True when `token` is expired at `now` or cannot be decoded at all.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match TokenClaims::decode(token) {
        Ok(claims) => claims.is_expired_at(now),
        Err(_) => true,
    }
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|seconds| seconds.is_finite())
            .map(|seconds| seconds.floor() as i64)
    })
}

fn string_claim(claims: &Map<String, Value>, key: &str) -> Option<String> {
    claims.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn decodes_backend_claims() {
        let token = token_with(json!({
            "sub": "ada@example.com",
            "email": "ada@example.com",
            "name": "Ada",
            "userId": 42,
            "roles": ["USER", {"authority": "ignored"}],
            "exp": 1_900_000_000,
        }));

        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.expires_at, 1_900_000_000);
        assert_eq!(claims.user_id, Some(42));
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert_eq!(claims.roles, vec!["USER".to_string()]);
    }

    #[test]
    fn expiry_is_strictly_before_now() {
        let token = token_with(json!({ "exp": 1_000 }));
        assert!(is_token_expired_at(&token, 1_001));
        assert!(!is_token_expired_at(&token, 1_000));
        assert!(!is_token_expired_at(&token, 999));
    }

    #[test]
    fn fractional_expiry_is_accepted() {
        let token = token_with(json!({ "exp": 2_000.75 }));
        assert_eq!(TokenClaims::decode(&token).unwrap().expires_at, 2_000);
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":50}"#);
        let token = format!("h.{payload}.s");
        assert!(payload.ends_with("=="));
        assert_eq!(TokenClaims::decode(&token).unwrap().expires_at, 50);
    }

    #[test]
    fn malformed_tokens_are_expired() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":"tomorrow"}"#);
        let not_object = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let no_exp = URL_SAFE_NO_PAD.encode(br#"{"sub":"x"}"#);
        let cases = [
            String::new(),
            "not-a-token".to_string(),
            "a.b".to_string(),
            "a.b.c.d".to_string(),
            "h.!!!not base64!!!.s".to_string(),
            format!("h.{payload}.s"),
            format!("h.{not_object}.s"),
            format!("h.{no_exp}.s"),
        ];

        for token in cases {
            assert!(is_token_expired_at(&token, 0), "{token:?} should be expired");
        }
    }

    #[test]
    fn segment_count_is_reported() {
        assert!(matches!(
            TokenClaims::decode("a.b"),
            Err(TokenDecodeError::SegmentCount(2))
        ));
    }

    #[test]
    fn login_response_converts_to_pair() {
        let response: AuthResponse = serde_json::from_value(json!({
            "userId": 1,
            "email": "a@b.c",
            "name": "A",
            "roles": ["USER"],
            "accessToken": "access",
            "refreshToken": "refresh",
        }))
        .unwrap();

        let pair = TokenPair::from(response);
        assert_eq!(pair.access_token, "access");
        assert_eq!(pair.refresh_token, "refresh");
    }
}
