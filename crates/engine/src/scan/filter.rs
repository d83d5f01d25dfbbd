use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Names skipped unless an include pattern asks for them by name.
pub const DEFAULT_JUNK: [&str; 2] = [".DS_Store", "Thumbs.db"];

/// Include/exclude glob filter over relative paths.
///
/// Patterns use shell-style matching where `*` also matches `/`, and each
/// pattern is tried against both the full relative path and the bare file
/// name, so `*.jpg` and `2024/*.jpg` both behave as expected.
///
/// ```
/// use photosync_engine::scan::Filter;
///
/// let filter = Filter::new(["*.jpg"], ["drafts/*"]).unwrap();
/// assert!(filter.matches("2024/summer/beach.jpg"));
/// assert!(!filter.matches("drafts/2024/beach.jpg"));
/// assert!(!filter.matches("notes.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl Default for Filter {
    fn default() -> Self {
        Self { include: None, exclude: GlobSet::empty() }
    }
}

impl Filter {
    /// # Errors
    /// [`ErrorKind::Filter`] naming the first pattern that fails to compile.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = Self::compile(include)?;
        let exclude = Self::compile(exclude)?;
        Ok(Self { include: (!include.is_empty()).then_some(include), exclude })
    }

    fn compile<P>(patterns: P) -> Result<GlobSet>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .build()
                .or_raise(|| ErrorKind::Filter(pattern.to_string()))?;
            builder.add(glob);
        }
        builder.build().or_raise(|| ErrorKind::Filter(String::new()))
    }

    /// Whether the file at `relative` (POSIX separators) should be synced.
    pub fn matches(&self, relative: &str) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        let hit = |set: &GlobSet| set.is_match(relative) || set.is_match(name);
        let included = self.include.as_ref().is_some_and(hit);
        if DEFAULT_JUNK.contains(&name) && !included {
            return false;
        }
        if self.include.is_some() && !included {
            return false;
        }
        !hit(&self.exclude)
    }
}
