//! OCLint violation report parser

use serde::Serialize;

use crate::xml::{XmlDocument, XmlElement, XmlReportParser};

const VIOLATION: &str = "violation";

/// A rule violation reported at a line of a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    path: String,
    start_line: u32,
    rule: String,
    message: String,
}

impl Violation {
    pub fn new(path: &str, start_line: u32, rule: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            start_line,
            rule: rule.to_string(),
            message: message.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    /// Rule key, e.g. `"deep nested block"`
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Parses OCLint XML reports into violations, in document order
#[derive(Debug, Clone, Copy, Default)]
pub struct OclintParser;

impl XmlReportParser for OclintParser {
    type Report = Vec<Violation>;

    fn parse_document(&self, document: &XmlDocument) -> Vec<Violation> {
        document
            .elements_by_tag(VIOLATION)
            .into_iter()
            .filter_map(parse_violation)
            .collect()
    }
}

fn parse_violation(element: &XmlElement) -> Option<Violation> {
    let path = element.attribute_or_empty("path");

    let Some(start_line) = element.parse_attribute::<u32>("startline") else {
        tracing::warn!(
            path,
            startline = element.attribute_or_empty("startline"),
            "skipping violation with invalid start line"
        );
        return None;
    };

    Some(Violation::new(
        path,
        start_line,
        element.attribute_or_empty("rule"),
        element.attribute_or_empty("message"),
    ))
}
