//! Source-unit discovery.
//!
//! Turns the paths a user passed (files or directories) into a sorted,
//! de-duplicated list of [`SourceUnit`]s for the driver. Entries the walk
//! cannot read are returned as [`ParseFailure`]s instead of ending the walk.

use crate::adapter::SourceUnit;
use crate::types::ParseFailure;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Errors that can occur while discovering source files.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DiscoveryError {
    /// A path given on the command line does not exist.
    #[error("path does not exist: {0}")]
    #[diagnostic(code(callgate::discovery::missing))]
    Missing(PathBuf),

    /// Exclude glob is invalid.
    #[error("Invalid glob pattern: {0}")]
    #[diagnostic(code(callgate::discovery::glob))]
    Glob(#[from] glob::PatternError),
}

/// Result of [`Discovery::collect`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// Units to analyze, sorted by path.
    pub units: Vec<SourceUnit>,
    /// Directories or files the walk could not read, sorted by path.
    pub unreadable: Vec<ParseFailure>,
}

/// Collects source units under a set of paths.
#[derive(Debug, Clone)]
pub struct Discovery {
    extensions: Vec<String>,
    exclude: Vec<glob::Pattern>,
    respect_gitignore: bool,
}

impl Discovery {
    /// Creates a discovery for files with the given extensions (e.g. `".kt"`).
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }

    /// Adds exclude glob patterns, matched against paths relative to the walk root.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.exclude.push(glob::Pattern::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Sets whether `.gitignore` files are honoured (default: true).
    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Discovers units under `paths`.
    ///
    /// Directories are walked and filtered by extension and exclude globs.
    /// Files named explicitly are always included, whatever their extension,
    /// so the driver can report unsupported ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a path does not exist.
    pub fn collect(&self, paths: &[PathBuf]) -> Result<Discovered, DiscoveryError> {
        let mut found = BTreeSet::new();
        let mut unreadable = Vec::new();

        for path in paths {
            if path.is_file() {
                found.insert(path.clone());
            } else if path.is_dir() {
                self.walk(path, &mut found, &mut unreadable);
            } else {
                return Err(DiscoveryError::Missing(path.clone()));
            }
        }

        unreadable.sort_by(|a, b| a.file.cmp(&b.file));
        debug!(
            "Discovered {} source files, {} unreadable path(s)",
            found.len(),
            unreadable.len()
        );
        Ok(Discovered {
            units: found.into_iter().map(SourceUnit::from_path).collect(),
            unreadable,
        })
    }

    fn walk(
        &self,
        root: &Path,
        found: &mut BTreeSet<PathBuf>,
        unreadable: &mut Vec<ParseFailure>,
    ) {
        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false);

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let file = error_path(&e).unwrap_or(root).to_path_buf();
                    warn!("Skipping {}: {}", file.display(), e);
                    unreadable.push(ParseFailure {
                        file,
                        location: None,
                        message: format!("unreadable: {e}"),
                    });
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !self.has_supported_extension(path) {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path);
            if self.is_excluded(relative) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            found.insert(path.to_path_buf());
        }
    }

    fn has_supported_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{ext}");
        self.extensions.iter().any(|e| *e == dotted)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let options = glob::MatchOptions {
            require_literal_separator: false,
            ..glob::MatchOptions::new()
        };
        self.exclude.iter().any(|pattern| {
            pattern.matches_path_with(relative, options)
                || pattern.matches_path_with(&Path::new("/").join(relative), options)
        })
    }
}

/// The path an `ignore` error refers to, if it carries one.
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}
