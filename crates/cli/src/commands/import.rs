use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use photoarchive_core::{scanner, Archive, AssetKind, ImportOutcome, ImportProgress, ImportSummary};

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:30.cyan/blue} {pos:>5}/{len:<5} {prefix:.dim} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
}

/// Split a `--tag a,b` argument into names.
pub(crate) fn parse_tags(arg: Option<&str>) -> Vec<String> {
    arg.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub fn run(archive: &Archive, paths: &[PathBuf], tag: Option<&str>) -> Result<()> {
    let tags = parse_tags(tag);
    let mut total = ImportSummary::default();

    for path in paths {
        if path.is_dir() {
            let summary = import_dir(archive, path, &tags)?;
            total.added += summary.added;
            total.existing += summary.existing;
            total.updated += summary.updated;
            total.movies += summary.movies;
        } else if scanner::is_kind(path, AssetKind::Movie) {
            let movie = archive.import_movie(path, &tags)?;
            println!("  movie  #{:<6} {}", movie.id.unwrap_or_default(), movie.filename);
            total.movies += 1;
        } else {
            let outcome = archive.import_photo(path, &tags)?;
            print_outcome(path, &outcome);
            match outcome {
                ImportOutcome::Existing(..) => total.existing += 1,
                ImportOutcome::Updated(_) => total.updated += 1,
                ImportOutcome::Added(_) => total.added += 1,
            }
        }
    }

    println!();
    println!(
        "  Import complete: {} added, {} already cataloged, {} refreshed, {} movies",
        total.added, total.existing, total.updated, total.movies
    );
    Ok(())
}

fn import_dir(archive: &Archive, dir: &Path, tags: &[String]) -> Result<ImportSummary> {
    let pb = ProgressBar::hidden();
    let summary = archive.import_tree(
        dir,
        tags,
        Some(&mut |progress| match progress {
            ImportProgress::Discovered { photos, movies } => {
                pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                pb.set_length((photos + movies) as u64);
                pb.set_style(active_style());
                pb.set_prefix("Importing");
            }
            ImportProgress::Photo { path, outcome } => {
                match &outcome {
                    ImportOutcome::Existing(photo, kind) => pb.println(format!(
                        "  {} is photo #{} ({kind})",
                        path.display(),
                        photo.id.unwrap_or_default()
                    )),
                    ImportOutcome::Updated(photo) => pb.println(format!(
                        "  {} changed; refreshed photo #{}",
                        path.display(),
                        photo.id.unwrap_or_default()
                    )),
                    ImportOutcome::Added(_) => {}
                }
                pb.set_message(file_name(&path));
                pb.inc(1);
            }
            ImportProgress::Movie { path } => {
                pb.set_message(file_name(&path));
                pb.inc(1);
            }
        }),
    )?;
    pb.finish_and_clear();
    Ok(summary)
}

fn print_outcome(path: &Path, outcome: &ImportOutcome) {
    match outcome {
        ImportOutcome::Existing(photo, kind) => println!(
            "  exists #{:<6} {} (matched {} by {kind})",
            photo.id.unwrap_or_default(),
            photo.filename,
            path.display()
        ),
        ImportOutcome::Updated(photo) => {
            println!("  update #{:<6} {}", photo.id.unwrap_or_default(), photo.filename)
        }
        ImportOutcome::Added(photo) => {
            println!("  added  #{:<6} {}", photo.id.unwrap_or_default(), photo.filename)
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(Some("Beach, Paul ,,")), vec!["Beach", "Paul"]);
        assert!(parse_tags(None).is_empty());
        assert!(parse_tags(Some("")).is_empty());
    }
}
