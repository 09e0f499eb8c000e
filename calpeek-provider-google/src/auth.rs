//! Service-account authorization (OAuth 2.0 JWT bearer grant).
//!
//! The key signs a short-lived RS256 assertion which the token endpoint
//! exchanges for an access token. Tokens are held in memory for the run
//! and never written to disk.

use std::fmt;

use calpeek_core::{CalPeekError, CalPeekResult};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::credentials::ServiceAccountKey;

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google accepts assertions valid for at most one hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Bearer token for the Calendar API.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        AccessToken {
            token: token.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    error_description: Option<String>,
}

/// Sign the JWT assertion for `key` as of `now`.
pub fn signed_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> CalPeekResult<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key_pem().as_bytes()).map_err(|e| {
        CalPeekError::Authorization(format!(
            "Invalid private key for {}: {}",
            key.client_email, e
        ))
    })?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let iat = now.timestamp();
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: CALENDAR_READONLY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &encoding_key).map_err(|e| {
        CalPeekError::Authorization(format!("Failed to sign token assertion: {}", e))
    })
}

/// Exchange a signed assertion for an access token.
pub async fn authorize(http: &reqwest::Client, key: &ServiceAccountKey) -> CalPeekResult<AccessToken> {
    let now = Utc::now();
    let assertion = signed_assertion(key, now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            CalPeekError::ProviderUnavailable(format!(
                "Token request to {} failed: {}",
                key.token_uri, e
            ))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<TokenErrorBody>(&body) {
            Ok(TokenErrorBody {
                error,
                error_description: Some(description),
            }) => format!("{}: {}", error, description),
            Ok(TokenErrorBody { error, .. }) => error,
            Err(_) => body,
        };

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CalPeekError::ProviderUnavailable(format!(
                "Token endpoint returned {}: {}",
                status, detail
            )));
        }
        return Err(CalPeekError::Authorization(format!(
            "Service account {} was rejected ({}): {}",
            key.client_email, status, detail
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        CalPeekError::ProviderUnavailable(format!("Failed to parse token response: {}", e))
    })?;

    let expires_at = TimeDelta::try_seconds(token.expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            CalPeekError::ProviderUnavailable(format!(
                "Token endpoint returned an invalid expires_in: {}",
                token.expires_in
            ))
        })?;

    info!(
        account = %key.client_email,
        expires_in = token.expires_in,
        "obtained calendar access token"
    );

    Ok(AccessToken {
        token: token.access_token,
        expires_at,
    })
}
