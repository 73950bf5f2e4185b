use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because configuration selects it and the storage crate dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How an uploaded video is referenced from its record.
///
/// `Signed` stores the composite `bucket,key` and resolves it to a presigned URL on read.
/// `Public` stores a direct URL under a public base (typically a CDN) that is served as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    Signed,
    Public,
}

impl FromStr for ReferenceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signed" => Ok(ReferenceMode::Signed),
            "public" => Ok(ReferenceMode::Public),
            _ => Err(anyhow::anyhow!("Invalid video reference mode: {}", s)),
        }
    }
}

impl Display for ReferenceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReferenceMode::Signed => write!(f, "signed"),
            ReferenceMode::Public => write!(f, "public"),
        }
    }
}
