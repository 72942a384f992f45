pub mod filter;
pub mod schema;
mod tags;

use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::config::ArchiveConfig;
use crate::domain::*;
use crate::error::{Error, Result};
use crate::exif;
use crate::scanner::hashing;
use filter::{FilterCriteria, Predicate, Target};

const PHOTO_COLUMNS: &str = "pid, filename, jpeg_filename, web_filename, width, height, \
     md5, jpeg_md5, web_md5, exposure_time, rating, modified";

const MOVIE_COLUMNS: &str =
    "pid, filename, width, height, duration, filesize, md5, exposure_time, rating, modified";

/// Relative size difference under which a re-measured dimension is treated
/// as unchanged.
const DIMENSION_TOLERANCE: f64 = 0.01;

/// SQLite-backed archive catalog: photos, movies, and their tags.
///
/// Every call is a single blocking statement or a short sequence of them;
/// sequences are not wrapped in transactions, so re-running an interrupted
/// upsert is the way to repair it.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::connection(path, e))?;
        }
        let conn = Connection::open(path).map_err(|e| Error::connection(path, e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| Error::connection(path, e))?;
        schema::ensure(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::connection(":memory:", e))?;
        schema::ensure(&conn)?;
        Ok(Self { conn })
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    // ── Photos ───────────────────────────────────────────────────────

    /// Fill in `photo.id` from the catalog row with the same filename, if
    /// there is one. Leaves an already-set id alone.
    pub fn resolve_photo_id(&self, photo: &mut Photo) -> Result<()> {
        if photo.id.is_none() {
            photo.id = self.id_for_filename(AssetKind::Photo, &photo.filename)?;
        }
        Ok(())
    }

    /// Insert or update `photo`, keyed by its normalized filename, then add
    /// its tags. On return the photo's path fields hold the stored
    /// (normalized) values and `photo.id` is set.
    pub fn upsert_photo(&self, config: &ArchiveConfig, photo: &mut Photo) -> Result<i64> {
        photo.filename = config.normalize_path(&photo.filename);
        if photo.filename.is_empty() {
            return Err(Error::EmptyFilename);
        }
        photo.jpeg_filename = photo.jpeg_filename.as_deref().map(|p| config.normalize_path(p));
        photo.web_filename = photo.web_filename.as_deref().map(|p| config.normalize_path(p));

        self.resolve_photo_id(photo)?;

        if let Some(id) = photo.id {
            tracing::debug!("updating photo {id} ({})", photo.filename);
            self.conn.execute(
                "UPDATE Photo SET filename=?1, jpeg_filename=?2, web_filename=?3, width=?4, height=?5,
                 md5=?6, jpeg_md5=?7, web_md5=?8, exposure_time=?9, rating=?10, modified=?11
                 WHERE pid=?12",
                params![
                    photo.filename,
                    photo.jpeg_filename,
                    photo.web_filename,
                    photo.width,
                    photo.height,
                    photo.md5,
                    photo.jpeg_md5,
                    photo.web_md5,
                    photo.exposure_time,
                    photo.rating,
                    photo.modified,
                    id,
                ],
            )?;
        } else {
            tracing::debug!("inserting photo {}", photo.filename);
            self.conn.execute(
                "INSERT INTO Photo (filename, jpeg_filename, web_filename, width, height,
                 md5, jpeg_md5, web_md5, exposure_time, rating, modified)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
                params![
                    photo.filename,
                    photo.jpeg_filename,
                    photo.web_filename,
                    photo.width,
                    photo.height,
                    photo.md5,
                    photo.jpeg_md5,
                    photo.web_md5,
                    photo.exposure_time,
                    photo.rating,
                    photo.modified,
                ],
            )?;
        }

        self.resolve_photo_id(photo)?;
        let id = photo.id.ok_or(Error::MissingIdentity(AssetKind::Photo))?;
        self.sync_associations(id, AssetKind::Photo, &photo.tags)?;
        Ok(id)
    }

    /// First photo whose original, full-size JPEG, or share-size hash equals
    /// `hash`. Lowest id wins when several rows match.
    pub fn photo_by_hash(&self, hash: &str) -> Result<Option<Photo>> {
        let photo = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PHOTO_COLUMNS} FROM Photo
                     WHERE md5 = ?1 OR jpeg_md5 = ?1 OR web_md5 = ?1
                     ORDER BY pid LIMIT 1"
                ),
                params![hash],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    /// First photo captured at exactly `timestamp`.
    pub fn photo_by_timestamp(&self, timestamp: i64) -> Result<Option<Photo>> {
        Ok(self.photos_by_timestamp(timestamp)?.into_iter().next())
    }

    /// Every photo captured at exactly `timestamp`, lowest id first.
    pub fn photos_by_timestamp(&self, timestamp: i64) -> Result<Vec<Photo>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {PHOTO_COLUMNS} FROM Photo WHERE exposure_time = ?1 ORDER BY pid"
        ))?;
        let photos = stmt
            .query_map(params![timestamp], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Photos matching the filter criteria. Fails with [`Error::Usage`]
    /// before touching the database if the criteria are malformed.
    pub fn list_photos(&self, criteria: &FilterCriteria) -> Result<Vec<Photo>> {
        let predicate = criteria.to_predicate()?;
        self.list_photos_matching(&predicate)
    }

    pub fn list_photos_matching(&self, predicate: &Predicate) -> Result<Vec<Photo>> {
        let clause = predicate.to_clause(&Target::catalog(AssetKind::Photo))?;
        let sql = format!(
            "SELECT {PHOTO_COLUMNS} FROM Photo WHERE {} ORDER BY pid",
            clause.sql
        );
        tracing::debug!("query: {sql}");
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(params_from_iter(clause.params.iter()), photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Fetch a photo by id with its tags and absolute rendition paths.
    pub fn load_photo(&self, config: &ArchiveConfig, id: i64) -> Result<Photo> {
        let mut photo = self
            .conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM Photo WHERE pid = ?1"),
                params![id],
                photo_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound {
                kind: AssetKind::Photo,
                id,
            })?;
        photo.tags = self.tags_for(id, AssetKind::Photo)?;
        photo.paths = Some(photo_paths(config, &photo));
        Ok(photo)
    }

    /// Delete a photo and all of its tag associations.
    pub fn remove_photo(&self, photo: &Photo) -> Result<()> {
        let id = photo.id.ok_or(Error::MissingIdentity(AssetKind::Photo))?;
        let unlinked = self.remove_associations(id, AssetKind::Photo)?;
        self.conn.execute("DELETE FROM Photo WHERE pid = ?1", params![id])?;
        tracing::debug!("removed photo {id} and {unlinked} tag associations");
        Ok(())
    }

    /// Point an existing photo at a replacement file, re-measuring it.
    pub fn replace_photo(&self, photo: &mut Photo, new_file: &Path) -> Result<()> {
        let (width, height) = exif::dimensions(new_file)?;
        let md5 = hashing::calculate_hashes(new_file)?.md5;
        self.replace_photo_with(photo, &Measurement { width, height, md5 }, new_file)
    }

    /// Apply an already-taken measurement of a replacement file.
    ///
    /// A dimension within 1% of the stored one keeps the stored value. The
    /// stored directory is kept; only the base name comes from `new_file`.
    pub fn replace_photo_with(
        &self,
        photo: &mut Photo,
        measured: &Measurement,
        new_file: &Path,
    ) -> Result<()> {
        let id = photo.id.ok_or(Error::MissingIdentity(AssetKind::Photo))?;
        let base = new_file.file_name().ok_or_else(|| {
            Error::Usage(format!("{} has no file name", new_file.display()))
        })?;
        let filename = Path::new(&photo.filename)
            .parent()
            .map(|dir| dir.join(base))
            .unwrap_or_else(|| PathBuf::from(base))
            .to_string_lossy()
            .into_owned();
        let width = within_tolerance(photo.width, measured.width);
        let height = within_tolerance(photo.height, measured.height);

        self.conn.execute(
            "UPDATE Photo SET filename = ?1, width = ?2, height = ?3, md5 = ?4 WHERE pid = ?5",
            params![filename, width, height, measured.md5, id],
        )?;

        photo.filename = filename;
        photo.width = Some(width);
        photo.height = Some(height);
        photo.md5 = Some(measured.md5.clone());
        Ok(())
    }

    pub fn count_photos(&self) -> Result<usize> {
        self.count(AssetKind::Photo)
    }

    // ── Movies ───────────────────────────────────────────────────────

    pub fn resolve_movie_id(&self, movie: &mut Movie) -> Result<()> {
        if movie.id.is_none() {
            movie.id = self.id_for_filename(AssetKind::Movie, &movie.filename)?;
        }
        Ok(())
    }

    /// Movie counterpart of [`Catalog::upsert_photo`].
    pub fn upsert_movie(&self, config: &ArchiveConfig, movie: &mut Movie) -> Result<i64> {
        movie.filename = config.normalize_path(&movie.filename);
        if movie.filename.is_empty() {
            return Err(Error::EmptyFilename);
        }

        self.resolve_movie_id(movie)?;

        let filesize = movie.filesize.map(|v| v as i64);
        if let Some(id) = movie.id {
            tracing::debug!("updating movie {id} ({})", movie.filename);
            self.conn.execute(
                "UPDATE Movie SET filename=?1, width=?2, height=?3, duration=?4, filesize=?5,
                 md5=?6, exposure_time=?7, rating=?8, modified=?9
                 WHERE pid=?10",
                params![
                    movie.filename,
                    movie.width,
                    movie.height,
                    movie.duration,
                    filesize,
                    movie.md5,
                    movie.exposure_time,
                    movie.rating,
                    movie.modified,
                    id,
                ],
            )?;
        } else {
            tracing::debug!("inserting movie {}", movie.filename);
            self.conn.execute(
                "INSERT INTO Movie (filename, width, height, duration, filesize,
                 md5, exposure_time, rating, modified)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
                params![
                    movie.filename,
                    movie.width,
                    movie.height,
                    movie.duration,
                    filesize,
                    movie.md5,
                    movie.exposure_time,
                    movie.rating,
                    movie.modified,
                ],
            )?;
        }

        self.resolve_movie_id(movie)?;
        let id = movie.id.ok_or(Error::MissingIdentity(AssetKind::Movie))?;
        self.sync_associations(id, AssetKind::Movie, &movie.tags)?;
        Ok(id)
    }

    pub fn list_movies(&self, criteria: &FilterCriteria) -> Result<Vec<Movie>> {
        let predicate = criteria.to_predicate()?;
        self.list_movies_matching(&predicate)
    }

    pub fn list_movies_matching(&self, predicate: &Predicate) -> Result<Vec<Movie>> {
        let clause = predicate.to_clause(&Target::catalog(AssetKind::Movie))?;
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM Movie WHERE {} ORDER BY pid",
            clause.sql
        );
        tracing::debug!("query: {sql}");
        let mut stmt = self.conn.prepare(&sql)?;
        let movies = stmt
            .query_map(params_from_iter(clause.params.iter()), movie_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    pub fn load_movie(&self, config: &ArchiveConfig, id: i64) -> Result<Movie> {
        let mut movie = self
            .conn
            .query_row(
                &format!("SELECT {MOVIE_COLUMNS} FROM Movie WHERE pid = ?1"),
                params![id],
                movie_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound {
                kind: AssetKind::Movie,
                id,
            })?;
        movie.tags = self.tags_for(id, AssetKind::Movie)?;
        movie.path = Some(config.movies_dir.join(&movie.filename));
        Ok(movie)
    }

    /// Movie removal has never cascaded to `MovieTag`; rather than guess at
    /// it, the operation is refused.
    pub fn remove_movie(&self, _movie: &Movie) -> Result<()> {
        Err(Error::Unsupported("movie removal"))
    }

    pub fn count_movies(&self) -> Result<usize> {
        self.count(AssetKind::Movie)
    }

    // ── Shared ───────────────────────────────────────────────────────

    fn id_for_filename(&self, kind: AssetKind, filename: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                &format!("SELECT pid FROM {} WHERE filename = ?1", kind.table()),
                params![filename],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn count(&self, kind: AssetKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        filename: row.get(1)?,
        jpeg_filename: row.get(2)?,
        web_filename: row.get(3)?,
        width: row.get(4)?,
        height: row.get(5)?,
        md5: row.get(6)?,
        jpeg_md5: row.get(7)?,
        web_md5: row.get(8)?,
        exposure_time: row.get(9)?,
        rating: row.get(10)?,
        modified: row.get(11)?,
        tags: Vec::new(),
        paths: None,
    })
}

fn movie_from_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        filename: row.get(1)?,
        width: row.get(2)?,
        height: row.get(3)?,
        duration: row.get(4)?,
        filesize: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
        md5: row.get(6)?,
        exposure_time: row.get(7)?,
        rating: row.get(8)?,
        modified: row.get(9)?,
        tags: Vec::new(),
        path: None,
    })
}

/// Absolute paths of a stored photo. Renditions without a stored path live
/// at the same relative directory as the original, as `<stem>.JPG`.
fn photo_paths(config: &ArchiveConfig, photo: &Photo) -> PhotoPaths {
    let relative = Path::new(&photo.filename);
    let derived = || {
        let stem = relative.file_stem().unwrap_or_default().to_string_lossy();
        relative
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("{stem}.JPG"))
    };
    PhotoPaths {
        original: config.originals_dir.join(relative),
        jpeg: config
            .jpegs_dir
            .join(photo.jpeg_filename.as_deref().map(PathBuf::from).unwrap_or_else(derived)),
        share: config
            .share_dir
            .join(photo.web_filename.as_deref().map(PathBuf::from).unwrap_or_else(derived)),
    }
}

/// Keep `stored` when `measured` differs from it by less than the tolerance.
fn within_tolerance(stored: Option<u32>, measured: u32) -> u32 {
    match stored {
        Some(stored) if stored > 0 => {
            let diff = stored.abs_diff(measured) as f64 / stored as f64;
            if diff < DIMENSION_TOLERANCE {
                stored
            } else {
                measured
            }
        }
        _ => measured,
    }
}
