use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The two kinds of asset the archive tracks. Each kind owns its own asset
/// table and its own tag association table; the tag vocabulary is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Photo,
    Movie,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Photo => "photo",
            AssetKind::Movie => "movie",
        }
    }

    /// Asset table name.
    pub fn table(&self) -> &'static str {
        match self {
            AssetKind::Photo => "Photo",
            AssetKind::Movie => "Movie",
        }
    }

    /// Association table linking this kind to `Tag`.
    pub fn tag_table(&self) -> &'static str {
        match self {
            AssetKind::Photo => "PhotoTag",
            AssetKind::Movie => "MovieTag",
        }
    }

    /// Foreign-key column in the association table that points at the asset.
    pub fn tag_column(&self) -> &'static str {
        match self {
            AssetKind::Photo => "photo_id",
            AssetKind::Movie => "movie_id",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute locations of a photo and its renditions, derived from the
/// configured roots when a photo is loaded. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoPaths {
    pub original: PathBuf,
    pub jpeg: PathBuf,
    pub share: PathBuf,
}

/// A cataloged photo. `id` stays `None` until the photo has a row in the
/// catalog; `Catalog::resolve_photo_id` fills it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Photo {
    pub id: Option<i64>,
    /// Path relative to one of the configured roots.
    pub filename: String,
    pub jpeg_filename: Option<String>,
    pub web_filename: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub md5: Option<String>,
    pub jpeg_md5: Option<String>,
    pub web_md5: Option<String>,
    /// Capture time, Unix seconds.
    pub exposure_time: Option<i64>,
    pub rating: i64,
    pub modified: bool,
    pub tags: Vec<String>,
    pub paths: Option<PhotoPaths>,
}

impl Photo {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }
}

/// A cataloged movie. Movies have no renditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Movie {
    pub id: Option<i64>,
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Seconds.
    pub duration: Option<f64>,
    /// Bytes.
    pub filesize: Option<u64>,
    pub md5: Option<String>,
    pub exposure_time: Option<i64>,
    pub rating: i64,
    pub modified: bool,
    pub tags: Vec<String>,
    /// Absolute location, set on load.
    pub path: Option<PathBuf>,
}

impl Movie {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }
}

/// Freshly measured properties of a replacement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub width: u32,
    pub height: u32,
    pub md5: String,
}
