//! Authentication seam
//!
//! The pipeline only needs to turn a bearer credential into a user id. Token formats and key
//! management live behind this trait so the API crate can plug in JWT verification and tests
//! can plug in anything else.

use uuid::Uuid;

use crate::AppError;

/// Verifies a bearer credential and returns the authenticated user id.
pub trait Authenticator: Send + Sync {
    /// Fails with `AppError::Unauthorized` for any missing, malformed or expired credential.
    fn authenticate(&self, token: &str) -> Result<Uuid, AppError>;
}
