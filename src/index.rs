//! Project file index
//!
//! The set of source files an analysis may attach measures to. Report
//! records are only ever resolved against this index, never against the
//! raw filesystem.

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A tracked source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InputFile {
    path: String,
    language: Option<String>,
}

impl InputFile {
    /// `path` is relative to the project, with `/` separators. The language
    /// is derived from the extension.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            language: language_of(path).map(str::to_string),
        }
    }

    pub fn with_language(path: &str, language: Option<&str>) -> Self {
        Self {
            path: path.to_string(),
            language: language.map(str::to_string),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Whether the file is Objective-C source
    pub fn is_objc(&self) -> bool {
        self.language.as_deref().is_some_and(|language| language.contains("objc"))
    }
}

fn language_of(path: &str) -> Option<&'static str> {
    let extension = Path::new(path).extension()?.to_str()?;
    match extension {
        "m" | "mm" | "h" => Some("objc"),
        "swift" => Some("swift"),
        _ => None,
    }
}

/// Read-only view of the tracked files of a project
pub trait FileIndex {
    fn base_dir(&self) -> &Path;

    /// Files in index order
    fn files(&self) -> &[InputFile];

    /// The file tracked at `path`. Absolute paths below the base directory
    /// and a leading `./` are accepted.
    fn has_path(&self, path: &str) -> Option<&InputFile> {
        let relative = relative_to(self.base_dir(), path);
        self.files().iter().find(|file| file.path() == relative)
    }

    /// Files whose relative path matches a glob pattern
    fn matching(&self, pattern: &str) -> Vec<&InputFile> {
        let pattern = match Pattern::new(pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid file pattern");
                return Vec::new();
            }
        };

        self.files()
            .iter()
            .filter(|file| pattern.matches_with(file.path(), match_options()))
            .collect()
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn relative_to(base_dir: &Path, path: &str) -> String {
    let candidate = Path::new(path);
    let relative = if candidate.is_absolute() {
        candidate.strip_prefix(base_dir).unwrap_or(candidate)
    } else {
        candidate
    };

    let text = to_slash(relative);
    match text.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Files of a project directory selected by glob patterns
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    base_dir: PathBuf,
    files: Vec<InputFile>,
}

impl ProjectFiles {
    /// Enumerate the files matching any of `sources` and none of `exclude`,
    /// sorted by path. A relative base directory is resolved first.
    pub fn scan(base_dir: &Path, sources: &[String], exclude: &[String]) -> Self {
        let base_dir = base_dir
            .canonicalize()
            .unwrap_or_else(|_| base_dir.to_path_buf());

        let exclude: Vec<Pattern> = exclude
            .iter()
            .filter_map(|pattern| match Pattern::new(pattern) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "invalid exclude pattern");
                    None
                }
            })
            .collect();

        let escaped_base = Pattern::escape(&base_dir.to_string_lossy());
        let mut paths = BTreeSet::new();

        for source in sources {
            let full_pattern = format!("{}/{}", escaped_base, source);
            let entries = match glob::glob(&full_pattern) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(pattern = %source, error = %e, "invalid source pattern");
                    continue;
                }
            };

            for path in entries.flatten().filter(|path| path.is_file()) {
                let Ok(relative) = path.strip_prefix(&base_dir) else {
                    continue;
                };
                let relative = to_slash(relative);

                let excluded = exclude
                    .iter()
                    .any(|pattern| pattern.matches_with(&relative, match_options()));
                if excluded {
                    continue;
                }
                paths.insert(relative);
            }
        }

        tracing::debug!(
            base_dir = %base_dir.display(),
            files = paths.len(),
            "indexed project files"
        );

        Self {
            base_dir,
            files: paths.iter().map(|path| InputFile::new(path)).collect(),
        }
    }

    /// An index over the given relative paths, kept in the given order
    pub fn from_paths<'a>(base_dir: &Path, paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            files: paths.into_iter().map(InputFile::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileIndex for ProjectFiles {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn files(&self) -> &[InputFile] {
        &self.files
    }
}
