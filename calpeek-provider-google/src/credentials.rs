//! Service-account key files.
//!
//! The JSON key downloaded from the Google Cloud console. Only the fields
//! needed to sign a token request are kept.

use std::fmt;
use std::path::Path;

use calpeek_core::{CalPeekError, CalPeekResult};
use serde::Deserialize;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    key_type: Option<String>,
    /// The account's identity; calendars must be shared with this address
    pub client_email: String,
    pub private_key_id: Option<String>,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> CalPeekResult<Self> {
        if !path.exists() {
            return Err(CalPeekError::Authorization(format!(
                "Service account key not found at {}.\n\n\
                Download a JSON key for your service account from\n\
                https://console.cloud.google.com/iam-admin/serviceaccounts\n\
                and point `credentials_path` (or CALPEEK_CREDENTIALS) at it.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CalPeekError::Authorization(format!(
                "Failed to read service account key from {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&contents).map_err(|e| match e {
            CalPeekError::Authorization(msg) => {
                CalPeekError::Authorization(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> CalPeekResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(contents).map_err(|e| {
            CalPeekError::Authorization(format!("Failed to parse service account key: {}", e))
        })?;

        match key.key_type.as_deref() {
            None | Some("service_account") => Ok(key),
            Some(other) => Err(CalPeekError::Authorization(format!(
                "Expected a service_account key, got '{}'",
                other
            ))),
        }
    }

    pub(crate) fn private_key_pem(&self) -> &str {
        &self.private_key
    }
}
