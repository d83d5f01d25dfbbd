//! Layered configuration.
//!
//! Values are merged lowest to highest priority:
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: the one given explicitly, otherwise
//!    `<config dir>/photosync/config.toml` if it exists
//! 3. `PHOTOSYNC_*` environment variables (`PHOTOSYNC_WORKERS=8`)
//! 4. Command-line flags ([`Overrides`])
//!
//! `--delete`, `--yes` and `--dry-run` are command-line only.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CACHE_FILE: &str = ".photosync-cache.json";
const ENV_PREFIX: &str = "PHOTOSYNC_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local directory to sync from.
    pub source: Option<PathBuf>,
    /// `s3://bucket[/prefix]` to sync into.
    pub dest: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
    pub workers: usize,
    /// Snapshot file for the content-hash cache.
    pub cache: PathBuf,
    pub follow_symlinks: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Skip uploading content that already exists elsewhere in the bucket.
    pub content_dedupe: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            dest: None,
            profile: None,
            region: None,
            endpoint: None,
            workers: DEFAULT_WORKERS,
            cache: PathBuf::from(DEFAULT_CACHE_FILE),
            follow_symlinks: false,
            include: Vec::new(),
            exclude: Vec::new(),
            content_dedupe: false,
        }
    }
}

/// Command-line values. Only what was actually given is serialized, so unset
/// flags don't clobber lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_dedupe: Option<bool>,
}

impl Config {
    /// Platform config file location, e.g. `~/.config/photosync/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "photosync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load and validate the merged configuration.
    ///
    /// An explicitly requested file must exist; the default one is optional.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::FileNotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        Self::figment(file.as_deref(), overrides).extract::<Self>().or_raise(|| ErrorKind::Invalid)?.validated()
    }

    /// The cache snapshot location with a leading `~` expanded.
    pub fn cache_path(&self) -> PathBuf {
        expand_home(&self.cache)
    }

    fn figment(file: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "reading config file");
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX)).merge(Serialized::defaults(overrides))
    }

    fn validated(self) -> Result<Self> {
        if self.workers < 1 {
            exn::bail!(ErrorKind::Validation("workers", "must be at least 1".to_string()));
        }
        if self.cache.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Validation("cache", "must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// Expand a leading `~` component to the user's home directory. Paths
/// without one, or when there is no home directory, are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("empty.toml");
            jail.create_file("empty.toml", "")?;
            let config = Config::load(Some(&path), &Overrides::default()).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.workers, 4);
            Ok(())
        });
    }

    #[test]
    fn test_layer_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "photosync.toml",
                r#"
                    workers = 2
                    region = "eu-west-1"
                    profile = "from-file"
                    exclude = ["*.tmp"]
                "#,
            )?;
            jail.set_env("PHOTOSYNC_WORKERS", "6");
            jail.set_env("PHOTOSYNC_PROFILE", "from-env");
            let overrides = Overrides { profile: Some("from-cli".to_string()), ..Overrides::default() };
            let path = jail.directory().join("photosync.toml");
            let config = Config::load(Some(&path), &overrides).unwrap();
            assert_eq!(config.region.as_deref(), Some("eu-west-1"));
            assert_eq!(config.exclude, vec!["*.tmp".to_string()]);
            assert_eq!(config.workers, 6);
            assert_eq!(config.profile.as_deref(), Some("from-cli"));
            Ok(())
        });
    }

    #[test]
    fn test_cli_lists_replace_file_lists() {
        Jail::expect_with(|jail| {
            jail.create_file("photosync.toml", r#"include = ["*.jpg"]"#)?;
            let overrides = Overrides { include: vec!["*.png".to_string()], ..Overrides::default() };
            let path = jail.directory().join("photosync.toml");
            let config = Config::load(Some(&path), &overrides).unwrap();
            assert_eq!(config.include, vec!["*.png".to_string()]);
            Ok(())
        });
    }

    #[rstest]
    #[case::relative("photos/cache.json", false)]
    #[case::absolute("/var/cache/photosync.json", false)]
    #[case::tilde_in_name("~cache.json", false)]
    #[case::home("~/cache.json", true)]
    fn test_expand_home(#[case] input: &str, #[case] expanded: bool) {
        let output = expand_home(Path::new(input));
        match BaseDirs::new() {
            Some(dirs) if expanded => assert_eq!(output, dirs.home_dir().join("cache.json")),
            _ => assert_eq!(output, Path::new(input)),
        }
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml")), &Overrides::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::FileNotFound(_)));
    }

    #[test]
    fn test_zero_workers_from_cli() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("empty.toml");
            jail.create_file("empty.toml", "")?;
            let overrides = Overrides { workers: Some(0), ..Overrides::default() };
            let err = Config::load(Some(&path), &overrides).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation("workers", _)));
            Ok(())
        });
    }

    #[rstest]
    #[case::zero_workers("workers = 0")]
    #[case::negative_workers("workers = -3")]
    #[case::wrong_type("content_dedupe = \"sometimes\"")]
    #[case::empty_cache("cache = \"\"")]
    fn test_invalid_file(#[case] content: &str) {
        // Inside a jail so no other test's environment leaks in.
        Jail::expect_with(|jail| {
            jail.create_file("photosync.toml", content)?;
            let path = jail.directory().join("photosync.toml");
            assert!(Config::load(Some(&path), &Overrides::default()).is_err());
            Ok(())
        });
    }
}
