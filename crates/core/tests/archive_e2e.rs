use std::fs;
use std::path::{Path, PathBuf};

use photoarchive_core::{
    Archive, ArchiveConfig, AssetKind, Error, FilterCriteria, ImportOutcome, ImportProgress,
    MatchKind,
};

/// Write a small JPEG whose bytes depend on the seed color.
fn create_jpeg(path: &Path, width: u32, height: u32, r: u8, g: u8, b: u8) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            r.wrapping_add((x * 3) as u8),
            g.wrapping_add((y * 3) as u8),
            b.wrapping_add(((x + y) * 2) as u8),
        ])
    });
    img.save(path).unwrap();
}

fn setup() -> (tempfile::TempDir, ArchiveConfig) {
    let tmp = tempfile::tempdir().unwrap();
    let config = ArchiveConfig::rooted_at(tmp.path());
    (tmp, config)
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn seed_originals(config: &ArchiveConfig) -> PathBuf {
    let dir = config.originals_dir.join("2024");
    create_jpeg(&dir.join("a.jpg"), 64, 64, 10, 20, 30);
    create_jpeg(&dir.join("b.jpg"), 64, 48, 200, 100, 50);
    fs::copy(dir.join("a.jpg"), dir.join("copy.jpg")).unwrap();
    dir
}

// ── Archive::open ────────────────────────────────────────────────

#[test]
fn test_open_creates_catalog() {
    let (_tmp, mut config) = setup();
    config.catalog_path = config.catalog_path.parent().unwrap().join("sub/dir/archive.db");

    let archive = Archive::open(config.clone()).unwrap();
    assert!(config.catalog_path.exists());
    archive.close().unwrap();
}

#[test]
fn test_reopen_persists() {
    let (_tmp, config) = setup();
    seed_originals(&config);
    {
        let archive = Archive::open(config.clone()).unwrap();
        archive.import_tree(&config.originals_dir, &[], None).unwrap();
        archive.close().unwrap();
    }
    let archive = Archive::open(config).unwrap();
    assert_eq!(archive.photos(&FilterCriteria::default()).unwrap().len(), 2);
}

#[test]
fn test_open_on_directory_fails() {
    let (tmp, mut config) = setup();
    config.catalog_path = tmp.path().to_path_buf();
    let err = Archive::open(config).err().unwrap();
    assert!(matches!(err, Error::Connection { .. } | Error::Database(_)));
}

// ── Import ───────────────────────────────────────────────────────

#[test]
fn test_import_tree_dedups_by_hash() {
    let (_tmp, config) = setup();
    seed_originals(&config);
    let archive = Archive::open(config.clone()).unwrap();

    let mut seen = Vec::new();
    let mut cb = |p: ImportProgress| {
        if let ImportProgress::Photo { path, outcome } = p {
            seen.push((path, outcome));
        }
    };
    let summary = archive
        .import_tree(&config.originals_dir, &[], Some(&mut cb))
        .unwrap();
    assert_eq!(summary.added, 2);
    assert_eq!(summary.existing, 1);
    assert_eq!(summary.movies, 0);

    assert_eq!(seen.len(), 3);
    match &seen[2].1 {
        ImportOutcome::Existing(photo, kind) => {
            assert_eq!(*kind, MatchKind::Hash);
            assert_eq!(photo.filename, "2024/a.jpg");
        }
        other => panic!("expected existing photo, got {other:?}"),
    }

    let photos = archive.photos(&FilterCriteria::default()).unwrap();
    let names: Vec<_> = photos.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(names, vec!["2024/a.jpg", "2024/b.jpg"]);
    assert_eq!(photos[1].width, Some(64));
    assert_eq!(photos[1].height, Some(48));
    assert_eq!(photos[0].md5.as_deref().map(str::len), Some(32));
}

#[test]
fn test_import_twice_is_idempotent() {
    let (_tmp, config) = setup();
    seed_originals(&config);
    let archive = Archive::open(config.clone()).unwrap();

    archive.import_tree(&config.originals_dir, &[], None).unwrap();
    let again = archive.import_tree(&config.originals_dir, &[], None).unwrap();
    assert_eq!(again.added, 0);
    assert_eq!(again.existing, 3);
    assert_eq!(archive.catalog().count_photos().unwrap(), 2);
}

#[test]
fn test_import_with_tags_then_filter() {
    let (_tmp, config) = setup();
    let dir = seed_originals(&config);
    let archive = Archive::open(config.clone()).unwrap();

    archive.import_photo(&dir.join("a.jpg"), &tags(&["Beach", "Paul"])).unwrap();
    archive.import_photo(&dir.join("b.jpg"), &tags(&["Beach"])).unwrap();
    // Re-importing a known photo adds the new tag only.
    let outcome = archive.import_photo(&dir.join("copy.jpg"), &tags(&["Holly"])).unwrap();
    assert!(matches!(outcome, ImportOutcome::Existing(_, MatchKind::Hash)));
    assert_eq!(outcome.photo().tags, vec!["Beach", "Paul", "Holly"]);

    let both = FilterCriteria {
        tag: Some("Beach, Paul".into()),
        ..FilterCriteria::default()
    };
    let photos = archive.photos(&both).unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].filename, "2024/a.jpg");

    assert_eq!(archive.tags().unwrap(), vec!["Beach", "Holly", "Paul"]);
}

#[test]
fn test_reimport_edited_original_keeps_rating_and_renditions() {
    let (_tmp, config) = setup();
    let path = config.originals_dir.join("2024/a.jpg");
    create_jpeg(&path, 64, 64, 10, 20, 30);
    let archive = Archive::open(config.clone()).unwrap();

    let id = archive.import_photo(&path, &[]).unwrap().photo().id.unwrap();
    let mut photo = archive.photo(id).unwrap();
    let old_md5 = photo.md5.clone();
    photo.rating = 5;
    photo.jpeg_filename = Some("2024/a.JPG".into());
    photo.jpeg_md5 = Some("0123456789abcdef0123456789abcdef".into());
    archive.catalog().upsert_photo(archive.config(), &mut photo).unwrap();

    // Edited in place: new pixels, no EXIF to match on.
    create_jpeg(&path, 32, 24, 90, 0, 160);
    let outcome = archive.import_photo(&path, &tags(&["Edited"])).unwrap();
    assert!(matches!(outcome, ImportOutcome::Updated(_)), "got {outcome:?}");

    let photo = archive.photo(id).unwrap();
    assert_eq!(photo.rating, 5);
    assert_eq!(photo.jpeg_filename.as_deref(), Some("2024/a.JPG"));
    assert_eq!(
        photo.jpeg_md5.as_deref(),
        Some("0123456789abcdef0123456789abcdef")
    );
    assert_ne!(photo.md5, old_md5);
    assert_eq!((photo.width, photo.height), (Some(32), Some(24)));
    assert_eq!(photo.tags, vec!["Edited"]);
    assert_eq!(archive.catalog().count_photos().unwrap(), 1);

    let summary = archive.import_tree(&config.originals_dir, &[], None).unwrap();
    assert_eq!((summary.added, summary.existing, summary.updated), (0, 1, 0));
}

#[test]
fn test_import_outside_roots_keeps_path() {
    let (tmp, config) = setup();
    let loose = tmp.path().join("inbox/loose.jpg");
    create_jpeg(&loose, 32, 32, 1, 2, 3);
    let archive = Archive::open(config).unwrap();

    let outcome = archive.import_photo(&loose, &[]).unwrap();
    assert_eq!(outcome.photo().filename, loose.to_string_lossy());
}

#[test]
fn test_import_movies() {
    let (_tmp, config) = setup();
    fs::create_dir_all(config.movies_dir.join("2024")).unwrap();
    fs::write(config.movies_dir.join("2024/clip.mov"), b"not really a movie").unwrap();
    let archive = Archive::open(config.clone()).unwrap();

    let summary = archive.import_tree(&config.movies_dir, &tags(&["Trip"]), None).unwrap();
    assert_eq!(summary.movies, 1);

    let movies = archive.movies(&FilterCriteria::default()).unwrap();
    assert_eq!(movies.len(), 1);
    let movie = archive.movie(movies[0].id.unwrap()).unwrap();
    assert_eq!(movie.filename, "2024/clip.mov");
    assert_eq!(movie.filesize, Some(18));
    assert_eq!(movie.tags, vec!["Trip"]);
    assert_eq!(movie.path, Some(config.movies_dir.join("2024/clip.mov")));
    assert!(matches!(
        archive.catalog().remove_movie(&movie),
        Err(Error::Unsupported(_))
    ));
}

// ── Match ────────────────────────────────────────────────────────

#[test]
fn test_find_match() {
    let (tmp, config) = setup();
    let dir = seed_originals(&config);
    let archive = Archive::open(config.clone()).unwrap();
    archive.import_photo(&dir.join("a.jpg"), &[]).unwrap();

    let (photo, kind) = archive.find_match(&dir.join("copy.jpg")).unwrap().unwrap();
    assert_eq!(kind, MatchKind::Hash);
    assert_eq!(photo.filename, "2024/a.jpg");

    let other = tmp.path().join("other.jpg");
    create_jpeg(&other, 16, 16, 99, 99, 99);
    assert!(archive.find_match(&other).unwrap().is_none());
}

// ── Load / remove / replace ──────────────────────────────────────

#[test]
fn test_load_derives_paths() {
    let (_tmp, config) = setup();
    let dir = seed_originals(&config);
    let archive = Archive::open(config.clone()).unwrap();
    let id = archive.import_photo(&dir.join("a.jpg"), &[]).unwrap().photo().id.unwrap();

    let paths = archive.photo(id).unwrap().paths.unwrap();
    assert_eq!(paths.original, config.originals_dir.join("2024/a.jpg"));
    assert_eq!(paths.jpeg, config.jpegs_dir.join("2024/a.JPG"));
    assert_eq!(paths.share, config.share_dir.join("2024/a.JPG"));
}

#[test]
fn test_remove_photo() {
    let (_tmp, config) = setup();
    let dir = seed_originals(&config);
    let archive = Archive::open(config).unwrap();
    let id = archive
        .import_photo(&dir.join("a.jpg"), &tags(&["A", "B"]))
        .unwrap()
        .photo()
        .id
        .unwrap();

    let removed = archive.remove_photo(id).unwrap();
    assert_eq!(removed.tags, vec!["A", "B"]);
    assert!(dir.join("a.jpg").exists());
    assert_eq!(archive.catalog().count_associations(AssetKind::Photo).unwrap(), 0);
    assert!(matches!(archive.photo(id), Err(Error::NotFound { .. })));
}

#[test]
fn test_replace_photo_remeasures() {
    let (tmp, config) = setup();
    let dir = seed_originals(&config);
    let archive = Archive::open(config).unwrap();
    let original = archive.import_photo(&dir.join("b.jpg"), &[]).unwrap();
    let id = original.photo().id.unwrap();

    let edited = tmp.path().join("edits/b-edit.jpg");
    create_jpeg(&edited, 128, 48, 5, 5, 5);
    let replaced = archive.replace_photo(id, &edited).unwrap();

    assert_eq!(replaced.filename, "2024/b-edit.jpg");
    assert_eq!(replaced.width, Some(128));
    assert_eq!(replaced.height, Some(48));
    assert_ne!(replaced.md5, original.photo().md5);
}

#[test]
fn test_missing_photo_is_not_found() {
    let (_tmp, config) = setup();
    let archive = Archive::open(config).unwrap();
    assert!(matches!(
        archive.photo(12),
        Err(Error::NotFound { kind: AssetKind::Photo, id: 12 })
    ));
    assert!(matches!(archive.remove_photo(12), Err(Error::NotFound { .. })));
}

// ── Filters ──────────────────────────────────────────────────────

#[test]
fn test_bad_rating_filter_is_usage_error() {
    let (_tmp, config) = setup();
    let archive = Archive::open(config).unwrap();
    let criteria = FilterCriteria {
        rating: Some("bogus".into()),
        ..FilterCriteria::default()
    };
    assert!(matches!(archive.photos(&criteria), Err(Error::Usage(_))));
    assert!(matches!(archive.movies(&criteria), Err(Error::Usage(_))));
}
