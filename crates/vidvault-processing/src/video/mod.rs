//! Video tool adapters

pub mod prober;
pub mod rewriter;
mod validation;

pub use prober::FfprobeProber;
pub use rewriter::FastStartRewriter;
