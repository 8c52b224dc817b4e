//! pub.dev OAuth credentials
//!
//! Credentials are either read from the file `dart pub login` maintains
//! (`~/.pub-cache/credentials.json`) or built from a bare access token.
//! They are never written back.

use crate::core::error::PluginError;
use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory under the home directory holding pub state
const PUB_CACHE_DIR: &str = ".pub-cache";

/// Credentials file name
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// pub.dev credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubCredentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_endpoint: String,
    /// Unix seconds; 0 means the token never expires
    #[serde(default)]
    pub expiration: i64,
}

impl PubCredentials {
    /// Credentials holding only an access token, with no expiration
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            ..Default::default()
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Check expiry against an explicit clock reading (Unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        if self.expiration == 0 {
            return false;
        }
        now > self.expiration
    }

    /// Non-empty access token that has not expired
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Access token wrapped for handing to a subprocess
    pub fn secret_token(&self) -> SecretString {
        SecretString::new(self.access_token.clone().into())
    }

    /// Masked token for logging
    ///
    /// Shows only the first 3 and last 3 characters; tokens shorter than
    /// 10 characters are fully masked as "****".
    pub fn masked_token(&self) -> String {
        mask_token(&self.access_token)
    }
}

/// Masks a token for safe logging
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Loader for persisted pub credentials
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    /// Default credentials location: `<home>/.pub-cache/credentials.json`
    pub fn default_path() -> Result<PathBuf, PluginError> {
        let home = dirs::home_dir().ok_or(PluginError::HomeDirUnavailable)?;
        Ok(home.join(PUB_CACHE_DIR).join(CREDENTIALS_FILE))
    }

    /// Load credentials from `path`, or from [`default_path`](Self::default_path)
    /// when `path` is empty
    pub async fn load(path: impl AsRef<Path>) -> Result<PubCredentials, PluginError> {
        let path = path.as_ref();
        let path = if path.as_os_str().is_empty() {
            Self::default_path()?
        } else {
            path.to_path_buf()
        };

        let data = fs::read_to_string(&path)
            .await
            .map_err(|source| PluginError::CredentialsRead {
                path: path.clone(),
                source,
            })?;

        serde_json::from_str(&data).map_err(|source| PluginError::CredentialsParse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CREDENTIALS_FILE);
        std::fs::write(
            &path,
            r#"{
  "accessToken": "ya29.access-token",
  "refreshToken": "1//refresh-token",
  "tokenEndpoint": "https://accounts.google.com/o/oauth2/token",
  "scopes": ["openid"],
  "expiration": 1700000000000
}"#,
        )
        .unwrap();

        let creds = CredentialStore::load(&path).await.unwrap();

        assert_eq!(creds.access_token, "ya29.access-token");
        assert_eq!(creds.refresh_token, "1//refresh-token");
        assert_eq!(creds.token_endpoint, "https://accounts.google.com/o/oauth2/token");
        assert_eq!(creds.expiration, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = CredentialStore::load(temp_dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(PluginError::CredentialsRead { .. })));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "{not json").unwrap();

        let result = CredentialStore::load(&path).await;
        assert!(matches!(result, Err(PluginError::CredentialsParse { .. })));
    }

    #[test]
    fn test_default_path_under_pub_cache() {
        if let Ok(path) = CredentialStore::default_path() {
            assert!(path.ends_with(".pub-cache/credentials.json"));
        }
    }

    #[test]
    fn test_from_token() {
        let creds = PubCredentials::from_token("test-token");

        assert_eq!(creds.access_token, "test-token");
        assert!(creds.refresh_token.is_empty());
        assert_eq!(creds.expiration, 0);
        assert!(creds.is_valid());
        assert_eq!(creds.secret_token().expose_secret(), "test-token");
    }

    #[test]
    fn test_zero_expiration_never_expires() {
        let creds = PubCredentials::from_token("token");
        assert!(!creds.is_expired());
        assert!(!creds.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_expiration_boundaries() {
        let creds = PubCredentials {
            access_token: "token".to_string(),
            expiration: 1_000,
            ..Default::default()
        };

        assert!(!creds.is_expired_at(999));
        assert!(!creds.is_expired_at(1_000));
        assert!(creds.is_expired_at(1_001));
    }

    #[test]
    fn test_past_expiration_is_invalid() {
        let creds = PubCredentials {
            access_token: "token".to_string(),
            expiration: Utc::now().timestamp() - 3_600,
            ..Default::default()
        };

        assert!(creds.is_expired());
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_future_expiration_is_valid() {
        let creds = PubCredentials {
            access_token: "token".to_string(),
            expiration: Utc::now().timestamp() + 3_600,
            ..Default::default()
        };

        assert!(!creds.is_expired());
        assert!(creds.is_valid());
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let never = PubCredentials::default();
        let future = PubCredentials {
            expiration: Utc::now().timestamp() + 3_600,
            ..Default::default()
        };

        assert!(!never.is_valid());
        assert!(!future.is_valid());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "****");
        assert_eq!(mask_token(""), "****");
        assert_eq!(mask_token("abcdef123456"), "abc...456");
        assert_eq!(PubCredentials::from_token("very-long-token-string").masked_token(), "ver...ing");
    }
}
