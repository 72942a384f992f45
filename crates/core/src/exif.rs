use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;

/// Read the capture time embedded in a file, as Unix seconds.
///
/// Tries `DateTimeOriginal` first, then `DateTime`. The EXIF value carries no
/// zone, so it is read as UTC. Anything that goes wrong (unreadable file, no
/// EXIF block, garbled value) yields `None`.
pub fn capture_timestamp(path: &Path) -> Option<i64> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("cannot open {} for EXIF: {e}", path.display());
            return None;
        }
    };

    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!("no EXIF in {}: {e}", path.display());
            return None;
        }
    };

    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, exif::In::PRIMARY))
        .find_map(|field| match field.value {
            exif::Value::Ascii(ref parts) => parts.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        })
}

/// Parse a raw EXIF date such as `2024:01:15 12:00:00` into Unix seconds.
pub fn parse_exif_datetime(raw: &[u8]) -> Option<i64> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    let date = NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?;
    let time = date.and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32)?;
    Some(time.and_utc().timestamp())
}

/// Pixel dimensions of an image file, read from its header.
pub fn dimensions(path: &Path) -> Result<(u32, u32)> {
    Ok(image::image_dimensions(path)?)
}
