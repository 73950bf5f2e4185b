//! Signed URLs for the local storage backend.
//!
//! Query string: `expires={unix_ts}&signature={base64url(HMAC-SHA256(secret, "GET\n{bucket}/{key}\n{expires}"))}`.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies expiring signatures over `bucket/key`.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> StorageResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing secret cannot be empty".to_string(),
            ));
        }
        Ok(Self { secret })
    }

    fn mac(&self, bucket: &str, key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(format!("GET\n{}/{}\n{}", bucket, key, expires).as_bytes());
        Ok(mac)
    }

    /// Returns `(expires, signature)` for a URL valid for `expires_in` from now.
    pub fn sign(&self, bucket: &str, key: &str, expires_in: Duration) -> StorageResult<(u64, String)> {
        let expires = now_secs().saturating_add(expires_in.as_secs());
        let tag = self.mac(bucket, key, expires)?.finalize().into_bytes();
        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag);
        Ok((expires, signature))
    }

    /// Fails with `InvalidKey` for a forged or tampered signature and `NotFound` once expired,
    /// so an expired link is indistinguishable from a missing object.
    pub fn verify(&self, bucket: &str, key: &str, expires: u64, signature: &str) -> StorageResult<()> {
        let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::InvalidKey("Invalid URL signature".to_string()))?;
        self.mac(bucket, key, expires)?
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidKey("Invalid URL signature".to_string()))?;

        if now_secs() > expires {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_verifies() {
        let signer = UrlSigner::new("test-secret").unwrap();
        let (expires, signature) = signer
            .sign("videos", "portrait/a.mp4", Duration::from_secs(60))
            .unwrap();
        assert!(signer
            .verify("videos", "portrait/a.mp4", expires, &signature)
            .is_ok());
    }

    #[test]
    fn test_signature_is_bound_to_key_and_expiry() {
        let signer = UrlSigner::new("test-secret").unwrap();
        let (expires, signature) = signer
            .sign("videos", "portrait/a.mp4", Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            signer.verify("videos", "portrait/b.mp4", expires, &signature),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            signer.verify("videos", "portrait/a.mp4", expires + 1, &signature),
            Err(StorageError::InvalidKey(_))
        ));
        let other = UrlSigner::new("other-secret").unwrap();
        assert!(other
            .verify("videos", "portrait/a.mp4", expires, &signature)
            .is_err());
    }

    #[test]
    fn test_expired_signature_is_rejected() {
        let signer = UrlSigner::new("test-secret").unwrap();
        let expires = now_secs() - 10;
        let tag = signer
            .mac("videos", "k.mp4", expires)
            .unwrap()
            .finalize()
            .into_bytes();
        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag);
        assert!(matches!(
            signer.verify("videos", "k.mp4", expires, &signature),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(UrlSigner::new(Vec::new()).is_err());
    }
}
