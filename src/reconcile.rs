//! File reconciler
//!
//! Maps the file or class references found in reports onto tracked
//! project files. Anything that does not resolve is dropped with a warning.

use glob::Pattern;

use crate::index::{FileIndex, InputFile};

/// Objective-C category separator in file names, e.g. `NSString+Utils.m`
const CATEGORY_SEPARATOR: char = '+';

pub struct Reconciler<'a> {
    index: &'a dyn FileIndex,
}

impl<'a> Reconciler<'a> {
    pub fn new(index: &'a dyn FileIndex) -> Self {
        Self { index }
    }

    /// Exact path match, used for coverage, violation and complexity reports
    pub fn resolve_path(&self, path: &str) -> Option<&'a InputFile> {
        match self.index.has_path(path) {
            Some(file) => self.objc_only(file),
            None => {
                tracing::warn!(path, "no path available for file");
                None
            }
        }
    }

    /// Source file of a test class, e.g. `BaseClass_CategoryTests` is found
    /// as `BaseClass+CategoryTests.m` anywhere in the project. Falls back to
    /// `<class>.m` at the project root.
    pub fn resolve_class(&self, class_name: &str) -> Option<&'a InputFile> {
        let file_name = class_name.replace('_', &CATEGORY_SEPARATOR.to_string());
        let file_name = Pattern::escape(&file_name);
        let pattern = format!("**/{}.*", file_name);

        let candidates = self.index.matching(&pattern);
        let implementation = candidates.iter().find(|file| is_implementation(file));
        if let Some(file) = implementation.or(candidates.first()).copied() {
            tracing::debug!(class_name, path = file.path(), "test class resolved by name");
            return self.objc_only(file);
        }

        let fallback = format!("{}.m", class_name.replace('.', "/"));
        match self.index.has_path(&fallback) {
            Some(file) => self.objc_only(file),
            None => {
                tracing::warn!(class_name, "unable to locate test source file");
                None
            }
        }
    }

    fn objc_only(&self, file: &'a InputFile) -> Option<&'a InputFile> {
        if file.is_objc() {
            Some(file)
        } else {
            tracing::debug!(
                path = file.path(),
                language = ?file.language(),
                "ignoring file that is not objective-c"
            );
            None
        }
    }
}

/// Test measures belong on `.m`/`.mm` files rather than their headers
fn is_implementation(file: &InputFile) -> bool {
    file.path().ends_with(".m") || file.path().ends_with(".mm")
}
