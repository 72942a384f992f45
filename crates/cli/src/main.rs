mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use photoarchive_core::{Archive, ArchiveConfig, FilterCriteria};

/// Photo archive catalog: originals, renditions, ratings, and tags
#[derive(Parser)]
#[command(name = "photoarchive", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (overrides PHOTOARCHIVE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Listing filters shared by every command that lists assets.
#[derive(Args, Debug, Default)]
pub struct Filters {
    /// Earliest capture date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Latest capture date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Rating comparison such as '>=3'
    #[arg(short, long)]
    rating: Option<String>,

    /// Comma-separated tags; all must be present
    #[arg(short, long)]
    tag: Option<String>,
}

impl From<Filters> for FilterCriteria {
    fn from(f: Filters) -> Self {
        FilterCriteria {
            from: f.from,
            to: f.to,
            rating: f.rating,
            tag: f.tag,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List cataloged photos
    Photos {
        #[command(flatten)]
        filters: Filters,
    },
    /// List cataloged movies
    Movies {
        #[command(flatten)]
        filters: Filters,
    },
    /// Show one photo (or movie with --movie) in detail
    Show {
        id: i64,
        #[arg(long)]
        movie: bool,
    },
    /// Find the cataloged photo a file corresponds to
    Match {
        file: PathBuf,
    },
    /// Catalog photo and movie files or directories
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Comma-separated tags to attach
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Remove a photo from the catalog (files are kept)
    Remove {
        id: i64,
    },
    /// Point a photo at a replacement file
    Replace {
        id: i64,
        file: PathBuf,
    },
    /// List the tag vocabulary
    Tags,
    /// Read from the external photo manager's library
    External {
        #[command(subcommand)]
        action: ExternalAction,
    },
}

#[derive(Subcommand)]
enum ExternalAction {
    /// List photos in the external library
    Photos {
        #[command(flatten)]
        filters: Filters,
    },
    /// List movies in the external library
    Movies {
        #[command(flatten)]
        filters: Filters,
    },
    /// List every tag the external library defines
    Tags,
    /// Bring ratings and tags from the external library into the catalog
    Sync {
        #[command(flatten)]
        filters: Filters,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = ArchiveConfig::load(cli.config.as_deref())?;
    let archive = match Archive::open(config) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::error!("{e}");
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Photos { filters } => commands::list::photos(&archive, filters.into())?,
        Commands::Movies { filters } => commands::list::movies(&archive, filters.into())?,
        Commands::Show { id, movie } => commands::show::run(&archive, id, movie)?,
        Commands::Match { file } => commands::show::find_match(&archive, &file)?,
        Commands::Import { paths, tag } => commands::import::run(&archive, &paths, tag.as_deref())?,
        Commands::Remove { id } => commands::edit::remove(&archive, id)?,
        Commands::Replace { id, file } => commands::edit::replace(&archive, id, &file)?,
        Commands::Tags => commands::list::tags(&archive)?,
        Commands::External { action } => match action {
            ExternalAction::Photos { filters } => {
                commands::external::list(&archive, photoarchive_core::AssetKind::Photo, filters.into())?
            }
            ExternalAction::Movies { filters } => {
                commands::external::list(&archive, photoarchive_core::AssetKind::Movie, filters.into())?
            }
            ExternalAction::Tags => commands::external::tags(&archive)?,
            ExternalAction::Sync { filters } => commands::external::sync(&archive, filters.into())?,
        },
    }

    archive.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_parse_into_criteria() {
        let cli = Cli::try_parse_from([
            "photoarchive",
            "photos",
            "--from",
            "2024-01-01",
            "--rating",
            ">=3",
            "--tag",
            "A,B",
        ])
        .unwrap();
        let Commands::Photos { filters } = cli.command else {
            panic!("expected photos command");
        };
        let criteria: FilterCriteria = filters.into();
        assert_eq!(criteria.from.as_deref(), Some("2024-01-01"));
        assert_eq!(criteria.to, None);
        assert_eq!(criteria.rating.as_deref(), Some(">=3"));
        assert_eq!(criteria.tag.as_deref(), Some("A,B"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["photoarchive", "tags", "--verbose", "--config", "x.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_import_requires_paths() {
        assert!(Cli::try_parse_from(["photoarchive", "import"]).is_err());
    }

    #[test]
    fn test_external_sync_parses() {
        let cli =
            Cli::try_parse_from(["photoarchive", "external", "sync", "--rating", "=5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::External {
                action: ExternalAction::Sync { .. }
            }
        ));
    }

    #[test]
    fn test_external_tags_parses() {
        let cli = Cli::try_parse_from(["photoarchive", "external", "tags"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::External {
                action: ExternalAction::Tags
            }
        ));
    }
}
