//! Google service-account authorisation (OAuth 2.0 JWT bearer grant)
//!
//! A short-lived RS256 assertion is signed with the service-account key and exchanged
//! at the token endpoint for an access token. Nothing is cached between calls.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use super::config::{Credentials, SheetsConfig};
use crate::domain::BackendError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(client_email: &str, token_uri: &str, now: DateTime<Utc>) -> Self {
        Self {
            iss: client_email.to_string(),
            scope: SHEETS_SCOPE.to_string(),
            aud: token_uri.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Sign the grant assertion with the service account's PEM key
pub fn sign_assertion(claims: &AssertionClaims, private_key: &str) -> Result<String, BackendError> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| BackendError::Unavailable(format!("Invalid service account key: {}", e)))?;

    encode(&Header::new(Algorithm::RS256), claims, &key)
        .map_err(|e| BackendError::Unavailable(format!("Failed to sign assertion: {}", e)))
}

/// Bearer token for one backend call
pub async fn access_token(
    http: &reqwest::Client,
    config: &SheetsConfig,
) -> Result<String, BackendError> {
    let (client_email, private_key) = match &config.credentials {
        Credentials::AccessToken(token) => return Ok(token.clone()),
        Credentials::ServiceAccount {
            client_email,
            private_key,
        } => (client_email, private_key),
    };

    let claims = AssertionClaims::new(client_email, &config.token_uri, Utc::now());
    let assertion = sign_assertion(&claims, private_key)?;

    let resp = http
        .post(&config.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| BackendError::Unavailable(format!("Token request failed: {}", e)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::error!("Token endpoint returned {}: {}", status, body);
        return Err(BackendError::Unavailable(format!(
            "Token endpoint returned status: {}",
            status
        )));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| BackendError::Unavailable(format!("Failed to parse token response: {}", e)))?;

    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DEFAULT_AUD: &str = "https://oauth2.googleapis.com/token";

    #[test]
    fn claims_expire_after_one_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let claims = AssertionClaims::new("svc@proj.iam.gserviceaccount.com", DEFAULT_AUD, now);
        assert_eq!(claims.iss, "svc@proj.iam.gserviceaccount.com");
        assert_eq!(claims.aud, DEFAULT_AUD);
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn invalid_key_is_reported() {
        let claims = AssertionClaims::new("svc@proj", DEFAULT_AUD, Utc::now());
        let err = sign_assertion(&claims, "not a pem").unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(msg) if msg.contains("service account key")));
    }

    #[tokio::test]
    async fn static_token_skips_exchange() {
        let config = SheetsConfig::new("sheet", Credentials::AccessToken("ya29.test".into()));
        let token = access_token(&reqwest::Client::new(), &config).await.unwrap();
        assert_eq!(token, "ya29.test");
    }
}
