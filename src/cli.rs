use clap::{ArgAction, Parser};
use photosync_config::Overrides;
use std::path::PathBuf;

/// Sync a local directory tree to S3 with idempotent uploads.
///
/// Every option except --dry-run, --delete and --yes can also be set in the
/// config file or through PHOTOSYNC_* environment variables.
#[derive(Debug, Parser)]
#[command(name = "photosync", version)]
pub struct Args {
    /// Local source directory.
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Destination S3 URI (s3://bucket/prefix).
    #[arg(long)]
    pub dest: Option<String>,
    /// AWS profile name.
    #[arg(long)]
    pub profile: Option<String>,
    /// AWS region.
    #[arg(long)]
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Show actions without uploading or deleting.
    #[arg(long)]
    pub dry_run: bool,
    /// Delete remote objects missing locally.
    #[arg(long)]
    pub delete: bool,
    /// Confirm dangerous operations non-interactively.
    #[arg(long)]
    pub yes: bool,
    /// Concurrent upload workers [default: 4].
    #[arg(long)]
    pub workers: Option<usize>,
    /// Cache file path [default: .photosync-cache.json].
    #[arg(long)]
    pub cache: Option<PathBuf>,
    /// Follow symlinks during directory walk.
    #[arg(long)]
    pub follow_symlinks: bool,
    /// Include glob pattern (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,
    /// Exclude glob pattern (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Skip uploads when the same content already exists in the bucket.
    #[arg(long)]
    pub content_dedupe: bool,
    /// Config file [default: <config dir>/photosync/config.toml].
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// More logging on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// The flags that were actually given, as the top configuration layer.
    /// A switch that is off means "not given", not "false".
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.clone(),
            dest: self.dest.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            workers: self.workers,
            cache: self.cache.clone(),
            follow_symlinks: self.follow_symlinks.then_some(true),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            content_dedupe: self.content_dedupe.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_repeatable_patterns() {
        let args = Args::try_parse_from([
            "photosync",
            "--source",
            "/photos",
            "--dest",
            "s3://bucket/prefix",
            "--include",
            "*.jpg",
            "--include",
            "*.heic",
            "--exclude",
            "drafts/*",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.include, ["*.jpg", "*.heic"]);
        assert_eq!(args.exclude, ["drafts/*"]);
        assert_eq!(args.verbose, 2);
    }

    #[rstest]
    #[case::nothing(&[], None, None)]
    #[case::switches(&["--follow-symlinks", "--content-dedupe"], Some(true), Some(true))]
    fn test_switches_only_override_when_given(
        #[case] flags: &[&str],
        #[case] follow_symlinks: Option<bool>,
        #[case] content_dedupe: Option<bool>,
    ) {
        let args = Args::try_parse_from(std::iter::once(&"photosync").chain(flags)).unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.follow_symlinks, follow_symlinks);
        assert_eq!(overrides.content_dedupe, content_dedupe);
        assert_eq!(overrides.workers, None);
    }

    #[test]
    fn test_invalid_workers() {
        assert!(Args::try_parse_from(["photosync", "--workers", "many"]).is_err());
    }
}
