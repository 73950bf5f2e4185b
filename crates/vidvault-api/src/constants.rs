//! API constants

/// Versioned prefix for every JSON endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Multipart field carrying the video bytes
pub const VIDEO_FORM_FIELD: &str = "video";

/// The only container the pipeline accepts
pub const ACCEPTED_CONTENT_TYPE: &str = "video/mp4";

/// Prefix for the asset route served by the local storage backend
pub const ASSETS_PREFIX: &str = "/assets";

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 256;
