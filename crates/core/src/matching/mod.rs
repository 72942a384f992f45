//! Identity resolution: decide which cataloged photo, if any, a file on disk
//! (or a record from another library) corresponds to.
//!
//! Two stages, the second only tried when the first finds nothing:
//!
//! 1. **Hash.** The candidate's MD5 is compared against the original, JPEG,
//!    and share hashes of every photo. Any hit is accepted outright.
//! 2. **Timestamp + name.** Photos captured in the same second as the
//!    candidate are compared by filename stem. Capture times collide often
//!    (bursts, multiple bodies), so the timestamp alone never decides.
//!
//! No match is a normal outcome: the candidate is a new asset.

use std::path::Path;

use crate::catalog::Catalog;
use crate::domain::Photo;
use crate::error::Result;
use crate::exif;
use crate::scanner::hashing;

/// Why a candidate was matched to a cataloged photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Hash,
    TimestampAndName,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Hash => "hash",
            MatchKind::TimestampAndName => "timestamp+name",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The facts about a file that identity resolution looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub md5: Option<String>,
    pub exposure_time: Option<i64>,
    /// Base name without extension.
    pub stem: String,
}

impl Candidate {
    /// Hash the file and read its capture time. A missing or unreadable
    /// EXIF block only costs the timestamp stage; an unreadable file is an
    /// error.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            md5: Some(hashing::calculate_hashes(path)?.md5),
            exposure_time: exif::capture_timestamp(path),
            stem: file_stem(path),
        })
    }
}

/// Stem of the last path component, or an empty string.
pub fn file_stem(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Best cataloged match for `candidate`, with the stage that found it.
pub fn find_closest_match(
    catalog: &Catalog,
    candidate: &Candidate,
) -> Result<Option<(Photo, MatchKind)>> {
    if let Some(md5) = candidate.md5.as_deref() {
        if let Some(photo) = catalog.photo_by_hash(md5)? {
            tracing::debug!("{} matched photo {:?} by hash", candidate.stem, photo.id);
            return Ok(Some((photo, MatchKind::Hash)));
        }
    }

    let Some(timestamp) = candidate.exposure_time.filter(|t| *t != 0) else {
        return Ok(None);
    };
    let same_second = catalog.photos_by_timestamp(timestamp)?;
    let found = same_second
        .into_iter()
        .find(|photo| file_stem(&photo.filename) == candidate.stem);
    if let Some(photo) = &found {
        tracing::debug!(
            "{} matched photo {:?} by timestamp and name",
            candidate.stem,
            photo.id
        );
    }
    Ok(found.map(|photo| (photo, MatchKind::TimestampAndName)))
}

/// [`find_closest_match`] for a file on disk.
pub fn find_closest_file_match(
    catalog: &Catalog,
    path: &Path,
) -> Result<Option<(Photo, MatchKind)>> {
    let candidate = Candidate::from_file(path)?;
    find_closest_match(catalog, &candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;

    const NOON: i64 = 1_704_110_400;

    fn config() -> ArchiveConfig {
        ArchiveConfig::rooted_at(Path::new("/archive"))
    }

    fn seeded() -> Catalog {
        let catalog = Catalog::open_in_memory().unwrap();
        let mut photo = Photo {
            md5: Some("orig".into()),
            jpeg_md5: Some("full".into()),
            web_md5: Some("web".into()),
            exposure_time: Some(NOON),
            ..Photo::new("2024/01/IMG_0001.CR2")
        };
        catalog.upsert_photo(&config(), &mut photo).unwrap();
        catalog
    }

    fn candidate(md5: Option<&str>, time: Option<i64>, stem: &str) -> Candidate {
        Candidate {
            md5: md5.map(String::from),
            exposure_time: time,
            stem: stem.to_string(),
        }
    }

    #[test]
    fn test_hash_match_ignores_name_and_time() {
        let catalog = seeded();
        let (photo, kind) = find_closest_match(&catalog, &candidate(Some("full"), None, "other"))
            .unwrap()
            .unwrap();
        assert_eq!(kind, MatchKind::Hash);
        assert_eq!(photo.filename, "2024/01/IMG_0001.CR2");
    }

    #[test]
    fn test_timestamp_with_other_stem_is_no_match() {
        let catalog = seeded();
        let found =
            find_closest_match(&catalog, &candidate(Some("zzz"), Some(NOON), "IMG_0002")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_timestamp_and_stem_match() {
        let catalog = seeded();
        let (photo, kind) =
            find_closest_match(&catalog, &candidate(Some("zzz"), Some(NOON), "IMG_0001"))
                .unwrap()
                .unwrap();
        assert_eq!(kind, MatchKind::TimestampAndName);
        assert_eq!(photo.filename, "2024/01/IMG_0001.CR2");
    }

    #[test]
    fn test_same_second_burst_picks_matching_stem() {
        let catalog = seeded();
        let mut second = Photo {
            md5: Some("burst".into()),
            exposure_time: Some(NOON),
            ..Photo::new("2024/01/IMG_0002.CR2")
        };
        catalog.upsert_photo(&config(), &mut second).unwrap();

        let (photo, _) = find_closest_match(&catalog, &candidate(None, Some(NOON), "IMG_0002"))
            .unwrap()
            .unwrap();
        assert_eq!(photo.id, second.id);
    }

    #[test]
    fn test_nothing_known_is_no_match() {
        let catalog = seeded();
        assert!(find_closest_match(&catalog, &candidate(None, None, "IMG_0001"))
            .unwrap()
            .is_none());
        assert!(find_closest_match(&catalog, &candidate(None, Some(0), "IMG_0001"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_file_candidate_hashes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_0009.JPG");
        std::fs::write(&path, b"hello world").unwrap();

        let candidate = Candidate::from_file(&path).unwrap();
        assert_eq!(candidate.md5.as_deref(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert_eq!(candidate.exposure_time, None);
        assert_eq!(candidate.stem, "IMG_0009");

        let catalog = Catalog::open_in_memory().unwrap();
        let mut photo = Photo {
            web_md5: Some("5eb63bbbe01eeed093cb22bb8f5acdc3".into()),
            ..Photo::new("elsewhere.CR2")
        };
        catalog.upsert_photo(&config(), &mut photo).unwrap();
        let (found, kind) = find_closest_file_match(&catalog, &path).unwrap().unwrap();
        assert_eq!(found.id, photo.id);
        assert_eq!(kind, MatchKind::Hash);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("2024/01/IMG_0001.CR2"), "IMG_0001");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(""), "");
    }
}
