use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};

use super::{ExternalAsset, ExternalId, ExternalSource};
use crate::catalog::filter::{Predicate, Target};
use crate::domain::AssetKind;
use crate::error::{Error, Result};

/// Flag bit Shotwell sets on assets moved to its trash.
const FLAG_TRASHED: i64 = 4;

/// A Shotwell library database, opened read-only.
pub struct ShotwellLibrary {
    conn: Connection,
}

impl ShotwellLibrary {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::ExternalLibrary {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("opened external library {}", path.display());
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Every tag name in the library.
    pub fn all_tags(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM TagTable ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn target(kind: AssetKind) -> Target<'static> {
        Target {
            table: table(kind),
            id_column: "id",
            time_column: "exposure_time",
            rating_column: "rating",
            tag_join: None,
        }
    }
}

fn table(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Photo => "PhotoTable",
        AssetKind::Movie => "VideoTable",
    }
}

fn columns(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Photo => {
            "id, filename, width, height, md5, exposure_time, rating, NULL, filesize"
        }
        AssetKind::Movie => {
            "id, filename, width, height, md5, exposure_time, rating, clip_duration, filesize"
        }
    }
}

fn asset_from_row(kind: AssetKind, row: &Row<'_>) -> rusqlite::Result<ExternalAsset> {
    Ok(ExternalAsset {
        id: ExternalId::new(kind, row.get(0)?),
        filename: row.get(1)?,
        width: row.get(2)?,
        height: row.get(3)?,
        md5: row.get(4)?,
        exposure_time: row.get::<_, Option<i64>>(5)?.filter(|t| *t != 0),
        rating: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        duration: row.get(7)?,
        filesize: row.get::<_, Option<i64>>(8)?.map(|v| v as u64),
    })
}

impl ExternalSource for ShotwellLibrary {
    /// Date and rating conditions run in SQL; tag conditions are checked
    /// per asset afterwards, since Shotwell keeps membership as text lists.
    fn list_assets(&self, kind: AssetKind, predicate: &Predicate) -> Result<Vec<ExternalAsset>> {
        let clause = predicate.without_tags().to_clause(&Self::target(kind))?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} AND (flags & {FLAG_TRASHED}) != {FLAG_TRASHED} ORDER BY id",
            columns(kind),
            table(kind),
            clause.sql,
        );
        tracing::debug!("external query: {sql}");

        let mut stmt = self.conn.prepare(&sql)?;
        let assets = stmt
            .query_map(params_from_iter(clause.params.iter()), |row| {
                asset_from_row(kind, row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let required = predicate.required_tags();
        if required.is_empty() {
            return Ok(assets);
        }
        let mut kept = Vec::with_capacity(assets.len());
        for asset in assets {
            let tags = self.tags_for(&asset.id)?;
            if required.iter().all(|name| tags.iter().any(|t| t == name)) {
                kept.push(asset);
            }
        }
        Ok(kept)
    }

    fn tags_for(&self, id: &ExternalId) -> Result<Vec<String>> {
        let pattern = format!("%{id}%");
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name FROM TagTable WHERE photo_id_list LIKE ?1 ORDER BY id")?;
        let names = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }
}
