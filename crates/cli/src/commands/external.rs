use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use photoarchive_core::external::ExternalAsset;
use photoarchive_core::{Archive, AssetKind, ExternalSource, FilterCriteria, ShotwellLibrary};

use super::list::{format_dimensions, format_timestamp};

fn open_library(archive: &Archive) -> Result<ShotwellLibrary> {
    let path = archive
        .config()
        .external_library
        .as_deref()
        .context("no external_library configured; set it in the config file")?;
    Ok(ShotwellLibrary::open(path)?)
}

pub fn list(archive: &Archive, kind: AssetKind, criteria: FilterCriteria) -> Result<()> {
    let library = open_library(archive)?;
    let predicate = criteria.to_predicate()?;
    let assets = library.list_assets(kind, &predicate)?;
    if assets.is_empty() {
        println!("No {kind}s match.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("File"),
        Cell::new("Size"),
        Cell::new("Taken"),
        Cell::new("Rating"),
        Cell::new("Tags"),
    ]);
    for asset in &assets {
        table.add_row(row(asset, library.tags_for(&asset.id)?));
    }
    println!("{table}");
    println!("  {} {kind}s", assets.len());
    Ok(())
}

fn row(asset: &ExternalAsset, tags: Vec<String>) -> Vec<Cell> {
    vec![
        Cell::new(asset.id),
        Cell::new(&asset.filename),
        Cell::new(format_dimensions(asset.width, asset.height)),
        Cell::new(format_timestamp(asset.exposure_time)),
        Cell::new(asset.rating),
        Cell::new(tags.join(", ")),
    ]
}

pub fn tags(archive: &Archive) -> Result<()> {
    for name in open_library(archive)?.all_tags()? {
        println!("{name}");
    }
    Ok(())
}

pub fn sync(archive: &Archive, criteria: FilterCriteria) -> Result<()> {
    let library = open_library(archive)?;
    let report = archive.reconcile(&library, &criteria)?;
    println!(
        "Synced external library: {} matched, {} added",
        report.matched, report.added
    );
    Ok(())
}
