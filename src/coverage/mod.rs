//! Coverage module
//!
//! Provides:
//! - Coverage model (packages → classes → lines)
//! - Cobertura XML parsing

mod cobertura;

pub use cobertura::*;

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Coverage of a single source line
///
/// Identity is the line number plus its condition totals; the hit count is
/// not part of it, so two reports of the same line with different hits
/// collapse into one.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoverageLine {
    number: u32,
    hits: u64,
    conditions: u32,
    conditions_covered: u32,
}

impl CoverageLine {
    /// A line without branch data
    pub fn new(number: u32, hits: u64) -> Self {
        Self {
            number,
            hits,
            conditions: 0,
            conditions_covered: 0,
        }
    }

    /// A line with branch totals. Totals that cannot describe real branch
    /// coverage (no conditions, or more covered than exist) are dropped.
    pub fn with_conditions(
        number: u32,
        hits: u64,
        conditions: u32,
        conditions_covered: u32,
    ) -> Self {
        if conditions == 0 || conditions_covered > conditions {
            return Self::new(number, hits);
        }

        Self {
            number,
            hits,
            conditions,
            conditions_covered,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn conditions(&self) -> u32 {
        self.conditions
    }

    pub fn conditions_covered(&self) -> u32 {
        self.conditions_covered
    }

    pub fn has_conditions(&self) -> bool {
        self.conditions > 0
    }

    fn identity(&self) -> (u32, u32, u32) {
        (self.number, self.conditions, self.conditions_covered)
    }
}

impl PartialEq for CoverageLine {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for CoverageLine {}

impl Hash for CoverageLine {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for CoverageLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CoverageLine {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Coverage for one source file of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageClass {
    filename: String,
    lines: BTreeSet<CoverageLine>,
}

impl CoverageClass {
    /// Duplicate lines keep their first occurrence
    pub fn new(filename: &str, lines: impl IntoIterator<Item = CoverageLine>) -> Self {
        let mut unique = BTreeSet::new();
        for line in lines {
            if !unique.contains(&line) {
                unique.insert(line);
            }
        }

        Self {
            filename: filename.to_string(),
            lines: unique,
        }
    }

    /// Path of the source file, relative to the report
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Lines ordered by line number
    pub fn lines(&self) -> impl Iterator<Item = &CoverageLine> {
        self.lines.iter()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// A named group of covered classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoveragePackage {
    name: String,
    classes: Vec<CoverageClass>,
}

impl CoveragePackage {
    /// Classes keep document order; exact duplicates are dropped
    pub fn new(name: &str, classes: impl IntoIterator<Item = CoverageClass>) -> Self {
        let mut unique: Vec<CoverageClass> = Vec::new();
        for class in classes {
            if !unique.contains(&class) {
                unique.push(class);
            }
        }

        Self {
            name: name.to_string(),
            classes: unique,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[CoverageClass] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_identity_ignores_hits() {
        assert_eq!(CoverageLine::new(1, 2), CoverageLine::new(1, 5));
        assert_ne!(CoverageLine::new(1, 2), CoverageLine::new(2, 2));
        assert_ne!(
            CoverageLine::with_conditions(1, 5, 2, 1),
            CoverageLine::with_conditions(1, 5, 2, 0)
        );
        assert_ne!(
            CoverageLine::with_conditions(1, 5, 2, 1),
            CoverageLine::with_conditions(1, 5, 4, 1)
        );
    }

    #[test]
    fn test_invalid_conditions_are_dropped() {
        let zero_total = CoverageLine::with_conditions(3, 1, 0, 0);
        assert!(!zero_total.has_conditions());

        let over_covered = CoverageLine::with_conditions(3, 1, 2, 3);
        assert!(!over_covered.has_conditions());
        assert_eq!(over_covered.conditions_covered(), 0);

        let valid = CoverageLine::with_conditions(3, 1, 4, 3);
        assert!(valid.has_conditions());
        assert!(valid.conditions_covered() <= valid.conditions());
    }

    #[test]
    fn test_class_deduplicates_lines() {
        let class = CoverageClass::new(
            "Sources/A.m",
            vec![CoverageLine::new(2, 1), CoverageLine::new(1, 3), CoverageLine::new(2, 9)],
        );

        let lines: Vec<_> = class.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number(), 1);
        // First occurrence wins
        assert_eq!(lines[1].hits(), 1);
    }

    #[test]
    fn test_class_equality_is_order_independent() {
        let a = CoverageClass::new("A.m", vec![CoverageLine::new(1, 1), CoverageLine::new(2, 0)]);
        let b = CoverageClass::new("A.m", vec![CoverageLine::new(2, 0), CoverageLine::new(1, 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_package_deduplicates_classes() {
        let class = CoverageClass::new("A.m", vec![CoverageLine::new(1, 1)]);
        let other = CoverageClass::new("B.m", vec![CoverageLine::new(1, 1)]);
        let package = CoveragePackage::new("app", vec![class.clone(), other, class]);

        assert_eq!(package.classes().len(), 2);
        assert_eq!(package.classes()[0].filename(), "A.m");
        assert_eq!(package.classes()[1].filename(), "B.m");
    }
}
