//! Application state shared by every handler.

use std::sync::Arc;
use vidvault_core::Authenticator;
use vidvault_db::VideoStore;
use vidvault_storage::{ReferenceResolver, Storage, UrlSigner};

use crate::services::upload::UploadOrchestrator;

/// Built once in [`crate::setup::services`] and handed to the router as `Arc<AppState>`.
///
/// Every field is either immutable or internally synchronized; nothing here is
/// request-specific.
pub struct AppState {
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn Storage>,
    pub resolver: ReferenceResolver,
    pub authenticator: Arc<dyn Authenticator>,
    pub uploads: UploadOrchestrator,
    /// Verifies `/assets` links. Present only for the local storage backend, which serves its
    /// own objects.
    pub asset_signer: Option<UrlSigner>,
}
