use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Verifies `X-Hub-Signature-256` headers against the shared webhook secret.
///
/// # Examples
///
/// ```
/// use lookout_server::signature::{sign, SignatureVerifier};
///
/// let verifier = SignatureVerifier::new(Some("s3cret".into()));
/// let header = sign("s3cret", b"{}");
/// assert!(verifier.verify(b"{}", Some(&header)));
/// assert!(!verifier.verify(b"{ }", Some(&header)));
/// ```
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
}

impl SignatureVerifier {
    /// A missing or empty secret rejects every request.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Check `header` against the HMAC-SHA256 of `body`.
    ///
    /// False when no secret is configured, the header is missing or lacks the
    /// `sha256=` prefix, or the hex digest does not decode. The digest
    /// comparison is constant-time.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> bool {
        let Some(secret) = self.secret.as_deref().filter(|s| !s.is_empty()) else {
            tracing::error!("webhook secret is not configured, rejecting request");
            return false;
        };
        let Some(hex_digest) = header.and_then(|h| h.strip_prefix(PREFIX)) else {
            return false;
        };
        let Ok(expected) = hex::decode(hex_digest) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

/// Compute the `sha256=<hex>` header value for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}
