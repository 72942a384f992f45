use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photoarchive_core::{Archive, FilterCriteria, Movie, Photo};

pub fn photos(archive: &Archive, criteria: FilterCriteria) -> Result<()> {
    let photos = archive.photos(&criteria)?;
    if photos.is_empty() {
        println!("No photos match.");
        return Ok(());
    }
    println!("{}", photo_table(&photos));
    println!("  {} photos", photos.len());
    Ok(())
}

pub fn movies(archive: &Archive, criteria: FilterCriteria) -> Result<()> {
    let movies = archive.movies(&criteria)?;
    if movies.is_empty() {
        println!("No movies match.");
        return Ok(());
    }
    println!("{}", movie_table(&movies));
    println!("  {} movies", movies.len());
    Ok(())
}

pub fn tags(archive: &Archive) -> Result<()> {
    for name in archive.tags()? {
        println!("{name}");
    }
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().map(Cell::new).collect::<Vec<_>>());
    table
}

pub(crate) fn photo_table(photos: &[Photo]) -> Table {
    let mut table = new_table(&["ID", "File", "Size", "Taken", "Rating", "Modified"]);
    for photo in photos {
        table.add_row(vec![
            Cell::new(photo.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(&photo.filename),
            Cell::new(format_dimensions(photo.width, photo.height)),
            Cell::new(format_timestamp(photo.exposure_time)),
            rating_cell(photo.rating),
            if photo.modified {
                Cell::new("yes").fg(Color::Yellow)
            } else {
                Cell::new("")
            },
        ]);
    }
    table
}

pub(crate) fn movie_table(movies: &[Movie]) -> Table {
    let mut table = new_table(&["ID", "File", "Size", "Duration", "Taken", "Rating"]);
    for movie in movies {
        table.add_row(vec![
            Cell::new(movie.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(&movie.filename),
            Cell::new(format_dimensions(movie.width, movie.height)),
            Cell::new(format_duration(movie.duration)),
            Cell::new(format_timestamp(movie.exposure_time)),
            rating_cell(movie.rating),
        ]);
    }
    table
}

fn rating_cell(rating: i64) -> Cell {
    if rating > 0 {
        Cell::new("\u{2605}".repeat(rating.clamp(0, 5) as usize)).fg(Color::Yellow)
    } else {
        Cell::new("\u{2014}").fg(Color::DarkGrey)
    }
}

pub(crate) fn format_dimensions(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => "?".to_string(),
    }
}

pub(crate) fn format_timestamp(ts: Option<i64>) -> String {
    match ts {
        Some(ts) if ts != 0 => chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        _ => "unknown".to_string(),
    }
}

pub(crate) fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => {
            let total = s.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        None => "?".to_string(),
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dimensions() {
        assert_eq!(format_dimensions(Some(1920), Some(1080)), "1920x1080");
        assert_eq!(format_dimensions(Some(1920), None), "?");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Some(1_704_110_400)), "2024-01-01 12:00:00");
        assert_eq!(format_timestamp(Some(0)), "unknown");
        assert_eq!(format_timestamp(None), "unknown");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(12.5)), "0:13");
        assert_eq!(format_duration(Some(125.0)), "2:05");
        assert_eq!(format_duration(None), "?");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(31_457_280), "30.0 MB");
    }

    #[test]
    fn test_photo_table_lists_every_photo() {
        let photos = vec![
            Photo {
                id: Some(1),
                rating: 3,
                ..Photo::new("2024/a.CR2")
            },
            Photo {
                id: Some(2),
                modified: true,
                ..Photo::new("2024/b.CR2")
            },
        ];
        let rendered = photo_table(&photos).to_string();
        assert!(rendered.contains("2024/a.CR2"));
        assert!(rendered.contains("2024/b.CR2"));
        assert!(rendered.contains("\u{2605}\u{2605}\u{2605}"));
    }
}
