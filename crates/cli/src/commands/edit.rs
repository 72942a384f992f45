use std::path::Path;

use anyhow::Result;
use photoarchive_core::Archive;

use super::list::format_dimensions;

pub fn remove(archive: &Archive, id: i64) -> Result<()> {
    let photo = archive.remove_photo(id)?;
    println!(
        "Removed photo #{id}: {} ({} tags unlinked)",
        photo.filename,
        photo.tags.len()
    );
    Ok(())
}

pub fn replace(archive: &Archive, id: i64, file: &Path) -> Result<()> {
    let before = archive.photo(id)?;
    let after = archive.replace_photo(id, file)?;
    println!("Replaced photo #{id}");
    println!("  file: {} -> {}", before.filename, after.filename);
    println!(
        "  size: {} -> {}",
        format_dimensions(before.width, before.height),
        format_dimensions(after.width, after.height)
    );
    Ok(())
}
