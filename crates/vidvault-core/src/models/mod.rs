pub mod video;

pub use video::{AspectClassification, StorageReference, VideoRecord};
