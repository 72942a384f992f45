//! Tag vocabulary and asset–tag associations.
//!
//! Tags form one flat, case-sensitive vocabulary shared by photos and movies.
//! Each asset kind has its own association table. Associations are only ever
//! added here: a name dropped from an asset's tag list leaves its existing
//! association in place.

use rusqlite::{params, OptionalExtension};

use super::Catalog;
use crate::domain::AssetKind;
use crate::error::Result;

impl Catalog {
    /// Add every name in `names` that is not yet in the vocabulary. Blank
    /// names are skipped.
    pub fn ensure_tags<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO Tag (name) VALUES (?1)")?;
        for name in names.iter().map(AsRef::as_ref) {
            if name.is_empty() {
                continue;
            }
            if stmt.execute(params![name])? > 0 {
                tracing::debug!("created tag {name:?}");
            }
        }
        Ok(())
    }

    pub fn tag_id(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT tid FROM Tag WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    /// Make sure the asset is associated with every tag in `names`, creating
    /// missing tags first. Existing associations are left untouched and none
    /// are removed.
    pub fn sync_associations<S: AsRef<str>>(
        &self,
        asset_id: i64,
        kind: AssetKind,
        names: &[S],
    ) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.ensure_tags(names)?;

        let table = kind.tag_table();
        let column = kind.tag_column();
        let exists_sql = format!("SELECT 1 FROM {table} WHERE {column} = ?1 AND tag_id = ?2");
        let insert_sql = format!("INSERT INTO {table} ({column}, tag_id) VALUES (?1, ?2)");

        for name in names.iter().map(AsRef::as_ref) {
            let Some(tag_id) = self.tag_id(name)? else {
                continue;
            };
            let linked = self
                .conn
                .prepare_cached(&exists_sql)?
                .exists(params![asset_id, tag_id])?;
            if !linked {
                self.conn
                    .prepare_cached(&insert_sql)?
                    .execute(params![asset_id, tag_id])?;
            }
        }
        Ok(())
    }

    /// Names of the tags associated with an asset, in association order.
    pub fn tags_for(&self, asset_id: i64, kind: AssetKind) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT Tag.name FROM {table} JOIN Tag ON Tag.tid = {table}.tag_id
             WHERE {table}.{column} = ?1 ORDER BY {table}.ptid",
            table = kind.tag_table(),
            column = kind.tag_column(),
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let names = stmt
            .query_map(params![asset_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// The whole tag vocabulary, by name.
    pub fn list_tags(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM Tag ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn count_tags(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Tag", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_associations(&self, kind: AssetKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.tag_table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub(crate) fn remove_associations(&self, asset_id: i64, kind: AssetKind) -> Result<usize> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", kind.tag_table(), kind.tag_column()),
            params![asset_id],
        )?;
        Ok(removed)
    }
}
