use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lookout_core::LookoutError;
use serde::{Deserialize, Serialize};

/// Backdate `iat` to tolerate clock drift with the API.
const ISSUED_AT_SKEW_SECS: i64 = 60;
/// Stay under the 10-minute maximum GitHub accepts.
const LIFETIME_SECS: i64 = 540;

/// Claims of a GitHub App JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// App id.
    pub iss: String,
}

/// Signs short-lived RS256 tokens that authenticate as a GitHub App.
///
/// The private key is parsed once at construction and reused for every
/// token.
pub struct AppJwtIssuer {
    app_id: u64,
    key: EncodingKey,
}

impl AppJwtIssuer {
    /// Build an issuer from PEM bytes (PKCS#1 or PKCS#8).
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Auth`] if the key cannot be parsed.
    pub fn from_pem(app_id: u64, pem: &[u8]) -> Result<Self, LookoutError> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| LookoutError::Auth(format!("invalid private key: {e}")))?;
        Ok(Self { app_id, key })
    }

    /// Load the PEM private key from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::FileNotFound`] if the file does not exist,
    /// [`LookoutError::Io`] if it cannot be read, or [`LookoutError::Auth`]
    /// if it does not hold an RSA key.
    pub fn from_file(app_id: u64, path: &Path) -> Result<Self, LookoutError> {
        if !path.exists() {
            return Err(LookoutError::FileNotFound(path.to_path_buf()));
        }
        let pem = std::fs::read(path)?;
        Self::from_pem(app_id, &pem)
    }

    /// App id placed in the `iss` claim.
    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Sign a token valid from one minute ago until nine minutes from now.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Auth`] if signing fails.
    pub fn issue(&self) -> Result<String, LookoutError> {
        self.issue_at(chrono::Utc::now().timestamp())
    }

    /// Sign a token relative to `now` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Auth`] if signing fails.
    pub fn issue_at(&self, now: i64) -> Result<String, LookoutError> {
        let claims = self.claims_at(now);
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| LookoutError::Auth(format!("failed to sign app token: {e}")))
    }

    fn claims_at(&self, now: i64) -> AppClaims {
        AppClaims {
            iat: now - ISSUED_AT_SKEW_SECS,
            exp: now + LIFETIME_SECS,
            iss: self.app_id.to_string(),
        }
    }
}

impl std::fmt::Debug for AppJwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppJwtIssuer")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}
