//! Vidvault Storage Library
//!
//! Object storage abstraction with S3 and local filesystem backends, plus the two pieces of
//! storage policy the upload pipeline relies on: key derivation and reference resolution.
//!
//! # Storage key format
//!
//! `{classification}/{base64url(32 random bytes)}.{extension}`, for example
//! `portrait/q1w2...e3r4.mp4`. Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod reference;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_key, extension_for_content_type};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reference::ReferenceResolver;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UrlSigner;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use vidvault_core::StorageBackend;
