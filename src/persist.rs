//! Persistence boundary
//!
//! Sensors hand every resolved record to a [`MeasureSink`]. How measures
//! are stored is up to the sink.

use serde::Serialize;

use crate::index::InputFile;

/// A value attached to a project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measure {
    LineCoverage {
        line: u32,
        hits: u64,
        /// `(conditions, covered)` for lines with branches
        conditions: Option<(u32, u32)>,
    },
    Tests {
        tests: usize,
        failures: usize,
        duration_ms: u64,
    },
    Issue {
        rule: String,
        line: u32,
        message: String,
    },
    Complexity {
        complexity: u32,
        functions: u32,
    },
}

pub trait MeasureSink {
    fn save(&mut self, file: &InputFile, measure: Measure);
}

/// A measure together with the file it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMeasure {
    pub path: String,
    #[serde(flatten)]
    pub measure: Measure,
}

/// Keeps measures in memory, in the order they were saved
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MemoryStore {
    measures: Vec<StoredMeasure>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measures(&self) -> &[StoredMeasure] {
        &self.measures
    }

    pub fn measures_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Measure> + 'a {
        self.measures
            .iter()
            .filter(move |stored| stored.path == path)
            .map(|stored| &stored.measure)
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn into_measures(self) -> Vec<StoredMeasure> {
        self.measures
    }
}

impl MeasureSink for MemoryStore {
    fn save(&mut self, file: &InputFile, measure: Measure) {
        self.measures.push(StoredMeasure {
            path: file.path().to_string(),
            measure,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_keeps_order() {
        let mut store = MemoryStore::new();
        let a = InputFile::new("A.m");
        let b = InputFile::new("B.m");

        store.save(&a, Measure::Complexity { complexity: 3, functions: 1 });
        store.save(&b, Measure::Tests { tests: 2, failures: 0, duration_ms: 4 });
        store.save(&a, Measure::LineCoverage { line: 1, hits: 2, conditions: None });

        assert_eq!(store.len(), 3);
        assert_eq!(store.measures()[1].path, "B.m");
        assert_eq!(store.measures_for("A.m").count(), 2);
    }

    #[test]
    fn test_measure_json() {
        let stored = StoredMeasure {
            path: "A.m".to_string(),
            measure: Measure::Issue {
                rule: "long line".to_string(),
                line: 7,
                message: "too long".to_string(),
            },
        };

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["path"], "A.m");
        assert_eq!(json["kind"], "issue");
        assert_eq!(json["rule"], "long line");
        assert_eq!(json["line"], 7);
    }
}
