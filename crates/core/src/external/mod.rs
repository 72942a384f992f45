//! Read-only access to asset libraries kept by other photo managers.

pub mod shotwell;

use std::fmt;

use crate::catalog::filter::Predicate;
use crate::domain::{AssetKind, Movie, Photo};
use crate::error::Result;

pub use shotwell::ShotwellLibrary;

/// Identity of an asset inside an external library.
///
/// The textual form is a kind prefix followed by the integer id as 16
/// zero-padded lowercase hex digits: `thumb000000000000002a` for photo 42,
/// `video-000000000000002a` for movie 42.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternalId {
    pub kind: AssetKind,
    pub id: i64,
}

impl ExternalId {
    pub fn new(kind: AssetKind, id: i64) -> Self {
        Self { kind, id }
    }

    fn prefix(kind: AssetKind) -> &'static str {
        match kind {
            AssetKind::Photo => "thumb",
            AssetKind::Movie => "video-",
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:016x}", Self::prefix(self.kind), self.id)
    }
}

/// One asset row as an external library describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAsset {
    pub id: ExternalId,
    /// Usually absolute.
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub md5: Option<String>,
    pub exposure_time: Option<i64>,
    pub rating: i64,
    pub duration: Option<f64>,
    pub filesize: Option<u64>,
}

impl ExternalAsset {
    /// A catalog photo carrying this asset's facts and the given tags.
    pub fn to_photo(&self, tags: Vec<String>) -> Photo {
        Photo {
            width: self.width,
            height: self.height,
            md5: self.md5.clone(),
            exposure_time: self.exposure_time,
            rating: self.rating,
            tags,
            ..Photo::new(self.filename.clone())
        }
    }

    pub fn to_movie(&self, tags: Vec<String>) -> Movie {
        Movie {
            width: self.width,
            height: self.height,
            duration: self.duration,
            filesize: self.filesize,
            md5: self.md5.clone(),
            exposure_time: self.exposure_time,
            rating: self.rating,
            tags,
            ..Movie::new(self.filename.clone())
        }
    }
}

/// A library the archive can read assets and tags from, but never writes.
pub trait ExternalSource {
    /// Assets of `kind` that satisfy `predicate`.
    fn list_assets(&self, kind: AssetKind, predicate: &Predicate) -> Result<Vec<ExternalAsset>>;

    /// Tag names attached to an asset.
    fn tags_for(&self, id: &ExternalId) -> Result<Vec<String>>;
}
