use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Video metadata record owned by a single user.
///
/// `video_url` holds either an encoded [`StorageReference`] or a direct URL, depending on the
/// deployment's reference mode. It is only ever written after the object upload succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Location of an object in a bucket, stored on the record as `bucket,key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReference {
    pub bucket: String,
    pub key: String,
}

impl StorageReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Encode as the composite value persisted on the record.
    pub fn encode(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Parse a stored value. Anything that does not split into exactly two parts on `,`
    /// is not a storage reference (a direct URL, for instance) and yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.split(',').collect();
        match parts.as_slice() {
            [bucket, key] => Some(Self::new(*bucket, *key)),
            _ => None,
        }
    }
}

impl Display for StorageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

/// Aspect ratio class of a probed video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClassification {
    Landscape,
    Portrait,
    Other,
}

impl AspectClassification {
    /// Classify by `width / height`. Bands are inclusive and checked portrait first.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectClassification::Other;
        }
        let ratio = f64::from(width) / f64::from(height);
        if (0.5..=0.6).contains(&ratio) {
            AspectClassification::Portrait
        } else if (1.7..=1.8).contains(&ratio) {
            AspectClassification::Landscape
        } else {
            AspectClassification::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClassification::Landscape => "landscape",
            AspectClassification::Portrait => "portrait",
            AspectClassification::Other => "other",
        }
    }
}

impl Display for AspectClassification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
