pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod exif;
pub mod external;
pub mod matching;
pub mod scanner;

use std::path::{Path, PathBuf};

pub use catalog::filter::{FilterCriteria, Predicate};
pub use catalog::Catalog;
pub use config::ArchiveConfig;
pub use domain::*;
pub use error::{Error, Result};
pub use external::{ExternalSource, ShotwellLibrary};
pub use matching::{Candidate, MatchKind};

/// What happened to a file handed to [`Archive::import_photo`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The file is already cataloged; the photo is the existing entry.
    Existing(Photo, MatchKind),
    /// A photo was already cataloged at this path but its contents no
    /// longer match; the file's measurements were refreshed in place.
    Updated(Photo),
    /// The file was new and has been added.
    Added(Photo),
}

impl ImportOutcome {
    pub fn photo(&self) -> &Photo {
        match self {
            ImportOutcome::Existing(photo, _)
            | ImportOutcome::Updated(photo)
            | ImportOutcome::Added(photo) => photo,
        }
    }
}

/// Callback for reporting import progress.
pub enum ImportProgress {
    /// Discovery finished under a directory.
    Discovered { photos: usize, movies: usize },
    /// A photo has been handled.
    Photo { path: PathBuf, outcome: ImportOutcome },
    /// A movie has been cataloged.
    Movie { path: PathBuf },
}

/// Totals from [`Archive::import_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub existing: usize,
    pub updated: usize,
    pub movies: usize,
}

/// Totals from [`Archive::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// External assets that resolved to an existing catalog entry, by
    /// content or by path.
    pub matched: usize,
    /// External assets added to the catalog.
    pub added: usize,
}

/// The main entry point: a catalog plus the configuration that locates the
/// files it describes.
pub struct Archive {
    catalog: Catalog,
    config: ArchiveConfig,
}

impl Archive {
    /// Open or create the catalog named by `config`.
    pub fn open(config: ArchiveConfig) -> Result<Self> {
        let catalog = Catalog::open(&config.catalog_path)?;
        Ok(Self { catalog, config })
    }

    /// Pair an already-open catalog with a configuration.
    pub fn with_catalog(catalog: Catalog, config: ArchiveConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn close(self) -> Result<()> {
        self.catalog.close()
    }

    /// Photos matching `criteria`.
    pub fn photos(&self, criteria: &FilterCriteria) -> Result<Vec<Photo>> {
        self.catalog.list_photos(criteria)
    }

    /// Movies matching `criteria`.
    pub fn movies(&self, criteria: &FilterCriteria) -> Result<Vec<Movie>> {
        self.catalog.list_movies(criteria)
    }

    /// A photo with its tags and absolute paths.
    pub fn photo(&self, id: i64) -> Result<Photo> {
        self.catalog.load_photo(&self.config, id)
    }

    pub fn movie(&self, id: i64) -> Result<Movie> {
        self.catalog.load_movie(&self.config, id)
    }

    /// The cataloged photo a file corresponds to, if any.
    pub fn find_match(&self, path: &Path) -> Result<Option<(Photo, MatchKind)>> {
        matching::find_closest_file_match(&self.catalog, path)
    }

    /// Catalog a photo file unless it is already known. A known photo only
    /// gains `tags`; nothing else about it changes. A file whose path is
    /// cataloged but whose contents changed keeps its rating and renditions
    /// and has only its hash, dimensions and capture time refreshed.
    pub fn import_photo(&self, path: &Path, tags: &[String]) -> Result<ImportOutcome> {
        let candidate = Candidate::from_file(path)?;
        if let Some((found, kind)) = matching::find_closest_match(&self.catalog, &candidate)? {
            let id = found.id.ok_or(Error::MissingIdentity(AssetKind::Photo))?;
            self.catalog.sync_associations(id, AssetKind::Photo, tags)?;
            tracing::info!("{} already cataloged as photo {id} ({kind})", path.display());
            return Ok(ImportOutcome::Existing(self.photo(id)?, kind));
        }

        let (width, height) = match crate::exif::dimensions(path) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                tracing::warn!("cannot read dimensions of {}: {e}", path.display());
                (None, None)
            }
        };
        let filename = absolute(path)?.to_string_lossy().into_owned();
        if let Some(mut photo) = self.cataloged_at(&filename)? {
            photo.width = width;
            photo.height = height;
            photo.md5 = candidate.md5;
            photo.exposure_time = candidate.exposure_time;
            photo.tags = tags.to_vec();
            let id = self.catalog.upsert_photo(&self.config, &mut photo)?;
            tracing::info!("{} changed on disk; refreshed photo {id}", path.display());
            return Ok(ImportOutcome::Updated(self.photo(id)?));
        }

        let mut photo = Photo {
            width,
            height,
            md5: candidate.md5,
            exposure_time: candidate.exposure_time,
            tags: tags.to_vec(),
            ..Photo::new(filename)
        };
        let id = self.catalog.upsert_photo(&self.config, &mut photo)?;
        tracing::info!("added {} as photo {id}", path.display());
        Ok(ImportOutcome::Added(self.photo(id)?))
    }

    /// The stored photo whose original lives at `filename`, if any.
    fn cataloged_at(&self, filename: &str) -> Result<Option<Photo>> {
        let mut lookup = Photo::new(self.config.normalize_path(filename));
        self.catalog.resolve_photo_id(&mut lookup)?;
        lookup.id.map(|id| self.photo(id)).transpose()
    }

    /// Catalog a movie file, keyed by its path.
    pub fn import_movie(&self, path: &Path, tags: &[String]) -> Result<Movie> {
        let hashes = scanner::hashing::calculate_hashes(path)?;
        let mut movie = Movie {
            filesize: Some(hashes.size),
            md5: Some(hashes.md5),
            exposure_time: crate::exif::capture_timestamp(path),
            tags: tags.to_vec(),
            ..Movie::new(absolute(path)?.to_string_lossy())
        };
        let id = self.catalog.upsert_movie(&self.config, &mut movie)?;
        tracing::info!("cataloged {} as movie {id}", path.display());
        self.movie(id)
    }

    /// Import every photo and movie found under `dir`.
    pub fn import_tree(
        &self,
        dir: &Path,
        tags: &[String],
        mut progress_cb: Option<&mut dyn FnMut(ImportProgress)>,
    ) -> Result<ImportSummary> {
        let photos = scanner::discover(dir, AssetKind::Photo)?;
        let movies = scanner::discover(dir, AssetKind::Movie)?;
        if let Some(ref mut cb) = progress_cb {
            cb(ImportProgress::Discovered {
                photos: photos.len(),
                movies: movies.len(),
            });
        }

        let mut summary = ImportSummary::default();
        for path in photos {
            let outcome = self.import_photo(&path, tags)?;
            match outcome {
                ImportOutcome::Existing(..) => summary.existing += 1,
                ImportOutcome::Updated(_) => summary.updated += 1,
                ImportOutcome::Added(_) => summary.added += 1,
            }
            if let Some(ref mut cb) = progress_cb {
                cb(ImportProgress::Photo { path, outcome });
            }
        }
        for path in movies {
            self.import_movie(&path, tags)?;
            summary.movies += 1;
            if let Some(ref mut cb) = progress_cb {
                cb(ImportProgress::Movie { path });
            }
        }
        Ok(summary)
    }

    /// Remove a photo and its tag associations. Files are left alone.
    pub fn remove_photo(&self, id: i64) -> Result<Photo> {
        let photo = self.photo(id)?;
        self.catalog.remove_photo(&photo)?;
        Ok(photo)
    }

    /// Re-point a photo at a replacement file and re-measure it.
    pub fn replace_photo(&self, id: i64, path: &Path) -> Result<Photo> {
        let mut photo = self.photo(id)?;
        self.catalog.replace_photo(&mut photo, path)?;
        self.photo(id)
    }

    /// The whole tag vocabulary.
    pub fn tags(&self) -> Result<Vec<String>> {
        self.catalog.list_tags()
    }

    /// Bring ratings and tags over from an external library.
    ///
    /// Each external photo is resolved against the catalog by hash, then by
    /// capture time and name. Matches take the external rating and gain its
    /// tags; the rest are added. Movies are keyed by path.
    pub fn reconcile(
        &self,
        source: &dyn ExternalSource,
        criteria: &FilterCriteria,
    ) -> Result<ReconcileReport> {
        let predicate = criteria.to_predicate()?;
        let mut report = ReconcileReport::default();

        for asset in source.list_assets(AssetKind::Photo, &predicate)? {
            let tags = source.tags_for(&asset.id)?;
            let candidate = Candidate {
                md5: asset.md5.clone(),
                exposure_time: asset.exposure_time,
                stem: matching::file_stem(&asset.filename),
            };
            match matching::find_closest_match(&self.catalog, &candidate)? {
                Some((mut photo, kind)) => {
                    tracing::debug!("{} matches photo {:?} ({kind})", asset.id, photo.id);
                    photo.rating = asset.rating;
                    photo.tags = tags;
                    self.catalog.upsert_photo(&self.config, &mut photo)?;
                    report.matched += 1;
                }
                None => match self.cataloged_at(&asset.filename)? {
                    Some(mut photo) => {
                        tracing::debug!("{} shares the path of photo {:?}", asset.id, photo.id);
                        photo.width = asset.width;
                        photo.height = asset.height;
                        photo.md5 = asset.md5.clone();
                        photo.exposure_time = asset.exposure_time;
                        photo.rating = asset.rating;
                        photo.tags = tags;
                        self.catalog.upsert_photo(&self.config, &mut photo)?;
                        report.matched += 1;
                    }
                    None => {
                        let mut photo = asset.to_photo(tags);
                        self.catalog.upsert_photo(&self.config, &mut photo)?;
                        report.added += 1;
                    }
                },
            }
        }

        for asset in source.list_assets(AssetKind::Movie, &predicate)? {
            let tags = source.tags_for(&asset.id)?;
            let mut movie = asset.to_movie(tags);
            movie.filename = self.config.normalize_path(&movie.filename);
            self.catalog.resolve_movie_id(&mut movie)?;
            if movie.id.is_some() {
                report.matched += 1;
            } else {
                report.added += 1;
            }
            self.catalog.upsert_movie(&self.config, &mut movie)?;
        }

        tracing::info!(
            "reconciled external library: {} matched, {} added",
            report.matched,
            report.added
        );
        Ok(report)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
