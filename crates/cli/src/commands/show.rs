use std::path::Path;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use photoarchive_core::{Archive, Movie, Photo};

use super::list::{format_dimensions, format_duration, format_size, format_timestamp};

pub fn run(archive: &Archive, id: i64, movie: bool) -> Result<()> {
    let table = if movie {
        movie_details(&archive.movie(id)?)
    } else {
        photo_details(&archive.photo(id)?)
    };
    println!("{table}");
    Ok(())
}

pub fn find_match(archive: &Archive, file: &Path) -> Result<()> {
    match archive.find_match(file)? {
        Some((photo, kind)) => {
            let id = photo.id.unwrap_or_default();
            println!("{} matches photo #{id} by {kind}", file.display());
            println!("{}", photo_details(&archive.photo(id)?));
        }
        None => println!("{} is not in the catalog", file.display()),
    }
    Ok(())
}

fn details(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("\u{2014}").to_string()
}

fn photo_details(photo: &Photo) -> Table {
    let mut rows = vec![
        ("ID", photo.id.map(|id| id.to_string()).unwrap_or_default()),
        ("File", photo.filename.clone()),
        ("JPEG", or_dash(photo.jpeg_filename.as_deref())),
        ("Share", or_dash(photo.web_filename.as_deref())),
        ("Size", format_dimensions(photo.width, photo.height)),
        ("Taken", format_timestamp(photo.exposure_time)),
        ("Rating", photo.rating.to_string()),
        ("Modified", photo.modified.to_string()),
        ("MD5", or_dash(photo.md5.as_deref())),
        ("JPEG MD5", or_dash(photo.jpeg_md5.as_deref())),
        ("Share MD5", or_dash(photo.web_md5.as_deref())),
        ("Tags", photo.tags.join(", ")),
    ];
    if let Some(paths) = &photo.paths {
        rows.push(("Original path", paths.original.display().to_string()));
        rows.push(("JPEG path", paths.jpeg.display().to_string()));
        rows.push(("Share path", paths.share.display().to_string()));
    }
    details(rows)
}

fn movie_details(movie: &Movie) -> Table {
    let mut rows = vec![
        ("ID", movie.id.map(|id| id.to_string()).unwrap_or_default()),
        ("File", movie.filename.clone()),
        ("Size", format_dimensions(movie.width, movie.height)),
        ("Duration", format_duration(movie.duration)),
        (
            "File size",
            movie.filesize.map(format_size).unwrap_or_else(|| "?".into()),
        ),
        ("Taken", format_timestamp(movie.exposure_time)),
        ("Rating", movie.rating.to_string()),
        ("Modified", movie.modified.to_string()),
        ("MD5", or_dash(movie.md5.as_deref())),
        ("Tags", movie.tags.join(", ")),
    ];
    if let Some(path) = &movie.path {
        rows.push(("Path", path.display().to_string()));
    }
    details(rows)
}
