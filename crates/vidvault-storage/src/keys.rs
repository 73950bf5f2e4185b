//! Storage key derivation.
//!
//! Key format: `{classification}/{base64url(32 random bytes)}.{extension}`. Uniqueness rests on
//! 256 bits of entropy; no collision check is made against the bucket.

use base64::Engine;
use rand::Rng;
use vidvault_core::AspectClassification;

const KEY_ENTROPY_BYTES: usize = 32;

/// Derive a fresh object key. Every call draws new bytes from the thread-local CSPRNG.
pub fn derive_key(classification: AspectClassification, extension: &str) -> String {
    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    rand::rng().fill(&mut bytes);
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    format!("{}/{}.{}", classification.as_str(), encoded, extension)
}

/// File extension from a MIME type's subtype, e.g. `video/mp4` -> `mp4`.
pub fn extension_for_content_type(content_type: &str) -> &str {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    essence.rsplit('/').next().unwrap_or(essence)
}
