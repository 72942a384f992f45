use rusqlite::Connection;

use crate::error::Result;

/// Whether the catalog tables are already present. Any error from the probe
/// counts as "absent".
pub fn tables_exist(conn: &Connection) -> bool {
    conn.prepare("SELECT 1 FROM Photo LIMIT 1")
        .and_then(|mut stmt| stmt.exists([]))
        .is_ok()
}

/// Create the catalog tables unless the probe finds them already there.
pub fn ensure(conn: &Connection) -> Result<()> {
    if tables_exist(conn) {
        return Ok(());
    }
    tracing::info!("catalog schema absent, creating tables");
    create_tables(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Photo (
            pid           INTEGER PRIMARY KEY AUTOINCREMENT,
            filename      TEXT NOT NULL UNIQUE,
            jpeg_filename TEXT UNIQUE,
            web_filename  TEXT UNIQUE,
            width         INTEGER,
            height        INTEGER,
            md5           TEXT,
            jpeg_md5      TEXT,
            web_md5       TEXT,
            exposure_time INTEGER,
            rating        INTEGER NOT NULL DEFAULT 0,
            modified      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_photo_md5 ON Photo(md5);
        CREATE INDEX IF NOT EXISTS idx_photo_jpeg_md5 ON Photo(jpeg_md5);
        CREATE INDEX IF NOT EXISTS idx_photo_web_md5 ON Photo(web_md5);
        CREATE INDEX IF NOT EXISTS idx_photo_exposure ON Photo(exposure_time);

        CREATE TABLE IF NOT EXISTS Tag (
            tid   INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS PhotoTag (
            ptid      INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id  INTEGER,
            tag_id    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_phototag_photo ON PhotoTag(photo_id);

        CREATE TABLE IF NOT EXISTS Movie (
            pid           INTEGER PRIMARY KEY AUTOINCREMENT,
            filename      TEXT NOT NULL UNIQUE,
            width         INTEGER,
            height        INTEGER,
            duration      REAL,
            filesize      INTEGER,
            md5           TEXT,
            exposure_time INTEGER,
            rating        INTEGER NOT NULL DEFAULT 0,
            modified      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_movie_exposure ON Movie(exposure_time);

        CREATE TABLE IF NOT EXISTS MovieTag (
            ptid      INTEGER PRIMARY KEY AUTOINCREMENT,
            movie_id  INTEGER,
            tag_id    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_movietag_movie ON MovieTag(movie_id);
        ",
    )?;
    Ok(())
}
