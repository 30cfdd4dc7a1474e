//! Report locator
//!
//! Finds report files below a base directory using glob patterns
//! (`*`, `?`, `**`). A missing directory simply matches nothing.

use glob::Pattern;
use std::path::{Path, PathBuf};

/// Locates report files relative to a base directory
#[derive(Debug, Clone)]
pub struct ReportFinder {
    base_dir: PathBuf,
}

impl ReportFinder {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// All files matching `pattern`, in enumeration order
    pub fn find_matching(&self, pattern: &str) -> Vec<PathBuf> {
        let full_pattern = self.full_pattern(pattern);

        let entries = match glob::glob(&full_pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid report pattern");
                return Vec::new();
            }
        };

        let mut reports = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => reports.push(path),
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "skipping unreadable path"),
            }
        }

        reports
    }

    /// First file matching `pattern`, if any
    pub fn find_first_matching(&self, pattern: &str) -> Option<PathBuf> {
        self.find_matching(pattern).into_iter().next()
    }

    fn full_pattern(&self, pattern: &str) -> String {
        if Path::new(pattern).is_absolute() {
            return pattern.to_string();
        }

        // The base directory is literal text, only the pattern may contain wildcards
        let base = Pattern::escape(&self.base_dir.to_string_lossy());
        let base = base.trim_end_matches(['/', '\\']);
        format!("{}/{}", base, pattern.trim_start_matches("./"))
    }
}
