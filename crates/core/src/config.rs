use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the archive lives on disk. Loaded once and passed by reference to
/// every catalog call that has to turn absolute paths into catalog paths or
/// back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_originals_dir")]
    pub originals_dir: PathBuf,

    #[serde(default = "default_jpegs_dir")]
    pub jpegs_dir: PathBuf,

    #[serde(default = "default_share_dir")]
    pub share_dir: PathBuf,

    #[serde(default = "default_movies_dir")]
    pub movies_dir: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Database of the desktop photo manager, read-only.
    #[serde(default)]
    pub external_library: Option<PathBuf>,
}

fn pictures_root() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("Pictures"))
        .join("archive")
}

fn default_originals_dir() -> PathBuf {
    pictures_root().join("originals")
}

fn default_jpegs_dir() -> PathBuf {
    pictures_root().join("jpeg")
}

fn default_share_dir() -> PathBuf {
    pictures_root().join("share")
}

fn default_movies_dir() -> PathBuf {
    pictures_root().join("movies")
}

fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photoarchive")
        .join("archive.db")
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            originals_dir: default_originals_dir(),
            jpegs_dir: default_jpegs_dir(),
            share_dir: default_share_dir(),
            movies_dir: default_movies_dir(),
            catalog_path: default_catalog_path(),
            external_library: None,
        }
    }
}

impl ArchiveConfig {
    /// Build a config whose four roots sit under `base`. Mostly useful for
    /// tests and throwaway archives.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            originals_dir: base.join("originals"),
            jpegs_dir: base.join("jpeg"),
            share_dir: base.join("share"),
            movies_dir: base.join("movies"),
            catalog_path: base.join("archive.db"),
            external_library: None,
        }
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    /// A missing default file is created with default values; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    let config = Self::default();
                    config.save(&path)?;
                    Ok(config)
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoarchive")
            .join("config.toml")
    }

    /// Roots checked, in order, when normalizing an absolute path.
    pub fn roots(&self) -> [&Path; 4] {
        [
            self.originals_dir.as_path(),
            self.jpegs_dir.as_path(),
            self.share_dir.as_path(),
            self.movies_dir.as_path(),
        ]
    }

    /// Strip the first configured root that prefixes `path`. Paths under no
    /// root (including paths that are already relative) come back unchanged.
    pub fn normalize_path(&self, path: &str) -> String {
        let candidate = Path::new(path);
        for root in self.roots() {
            if let Ok(rest) = candidate.strip_prefix(root) {
                return rest.to_string_lossy().into_owned();
            }
        }
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ArchiveConfig {
        ArchiveConfig::rooted_at(Path::new("/archive"))
    }

    #[test]
    fn test_normalize_strips_each_root() {
        let config = config();
        assert_eq!(config.normalize_path("/archive/originals/2024/a.CR2"), "2024/a.CR2");
        assert_eq!(config.normalize_path("/archive/jpeg/2024/a.JPG"), "2024/a.JPG");
        assert_eq!(config.normalize_path("/archive/share/2024/a.JPG"), "2024/a.JPG");
        assert_eq!(config.normalize_path("/archive/movies/2024/a.MOV"), "2024/a.MOV");
    }

    #[test]
    fn test_normalize_leaves_foreign_paths_alone() {
        let config = config();
        assert_eq!(config.normalize_path("/elsewhere/a.jpg"), "/elsewhere/a.jpg");
        assert_eq!(config.normalize_path("2024/a.jpg"), "2024/a.jpg");
        // Component-wise prefix, not a string prefix.
        assert_eq!(
            config.normalize_path("/archive/originals-old/a.jpg"),
            "/archive/originals-old/a.jpg"
        );
    }

    #[test]
    fn test_toml_defaults_fill_missing_fields() {
        let parsed: ArchiveConfig = toml::from_str(
            r#"
            originals_dir = "/data/originals"
            external_library = "/home/me/.local/share/shotwell/data/photo.db"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.originals_dir, PathBuf::from("/data/originals"));
        assert_eq!(parsed.jpegs_dir, default_jpegs_dir());
        assert_eq!(
            parsed.external_library.as_deref(),
            Some(Path::new("/home/me/.local/share/shotwell/data/photo.db"))
        );
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/config.toml");
        let config = ArchiveConfig::rooted_at(tmp.path());
        config.save(&path).unwrap();
        assert_eq!(ArchiveConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ArchiveConfig::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}
