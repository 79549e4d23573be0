//! Log file discovery with gitignore support
//!
//! Directories named on the command line are walked with the `ignore` crate
//! and filtered through `globset` include/exclude patterns. Files named
//! explicitly are always taken, whatever the patterns say.

use crate::types::GlobPattern;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file walking
#[derive(Debug, Error)]
pub enum FileWalkerError {
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Reason why a path was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Path did not match the include patterns, or matched an exclude
    ExcludedByPattern,
    /// Path is not a regular file
    NotAFile,
}

/// Result of file walking: either a log file or a skipped path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkResult {
    File(PathBuf),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Iterator source over the log files under one root
pub struct FileWalker {
    walker: ignore::Walk,
    include_set: Option<GlobSet>,
    exclude_set: GlobSet,
}

impl FileWalker {
    /// Creates a new FileWalker
    ///
    /// # Arguments
    /// * `root` - Root directory to walk
    /// * `include` - Include patterns (empty means include all)
    /// * `exclude` - Exclude patterns (applied after include)
    pub fn new(
        root: &Path,
        include: &[GlobPattern],
        exclude: &[GlobPattern],
    ) -> Result<Self, FileWalkerError> {
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let include_set = if include.is_empty() {
            None
        } else {
            Some(build_globset(include)?)
        };

        // Always exclude .git directory, merging with user-provided excludes
        let mut exclude_patterns = Vec::from(exclude);
        exclude_patterns.push(GlobPattern::new("**/.git/**"));
        let exclude_set = build_globset(&exclude_patterns)?;

        Ok(Self {
            walker,
            include_set,
            exclude_set,
        })
    }

    /// Walks the tree and yields matching files in file-name order
    pub fn walk(self) -> impl Iterator<Item = Result<PathBuf, FileWalkerError>> {
        self.walk_with_skip_info().filter_map(|result| match result {
            Ok(WalkResult::File(path)) => Some(Ok(path)),
            Ok(WalkResult::Skipped { .. }) => None,
            Err(e) => Some(Err(e)),
        })
    }

    /// Walks the tree and also reports skipped paths
    pub fn walk_with_skip_info(self) -> impl Iterator<Item = Result<WalkResult, FileWalkerError>> {
        let include_set = self.include_set;
        let exclude_set = self.exclude_set;

        self.walker.map(move |result| {
            let entry = result?;
            let path = entry.path().to_path_buf();

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return Ok(WalkResult::Skipped {
                    path,
                    reason: SkipReason::NotAFile,
                });
            }

            let included = include_set.as_ref().is_none_or(|set| set.is_match(&path));
            if !included || exclude_set.is_match(&path) {
                return Ok(WalkResult::Skipped {
                    path,
                    reason: SkipReason::ExcludedByPattern,
                });
            }

            Ok(WalkResult::File(path))
        })
    }
}

fn build_globset(patterns: &[GlobPattern]) -> Result<GlobSet, FileWalkerError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern.as_str()).map_err(|e| FileWalkerError::InvalidGlob {
            pattern: pattern.as_str().to_string(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| FileWalkerError::InvalidGlob {
        pattern: "<globset>".to_string(),
        source: e,
    })
}

/// Expand command-line paths into the list of log files to analyze
///
/// Regular files are returned as given; directories are walked with the
/// include/exclude patterns. Order follows `paths`, then file name.
pub fn discover_log_files(
    paths: &[PathBuf],
    include: &[GlobPattern],
    exclude: &[GlobPattern],
) -> Result<Vec<PathBuf>, FileWalkerError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for file in FileWalker::new(path, include, exclude)?.walk() {
                files.push(file?);
            }
        } else {
            return Err(FileWalkerError::NotFound(path.clone()));
        }
    }
    tracing::debug!(count = files.len(), "discovered log files");
    Ok(files)
}
