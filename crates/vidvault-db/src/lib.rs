//! Vidvault Database Layer
//!
//! Repositories over the `videos` table. Handlers and the upload pipeline depend on the
//! [`VideoStore`] trait so tests can run without Postgres.

pub mod db;

pub use db::video::{PgVideoRepository, VideoStore};
