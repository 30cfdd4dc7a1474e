//! Error types shared by the report readers

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a report file into an XML document.
///
/// These never escape the report readers: [`crate::xml::XmlReportParser::parse`]
/// logs them and yields no report instead.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no report exists at path: '{}'", path.display())]
    Missing { path: PathBuf },

    #[error("unable to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// The document ended while elements were still open.
    #[error("XML document ends with {open} unclosed element(s)")]
    Truncated { open: usize },

    #[error("XML document has no root element")]
    NoRoot,

    #[error("XML document has more than one root element")]
    MultipleRoots,
}

/// A rule catalog whose lines break the expected block shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Severity codes map onto INFO..=BLOCKER; anything else is rejected.
    #[error("line {line}: severity code {code} is outside 0..=4")]
    SeverityOutOfRange { line: usize, code: i64 },

    #[error("line {line}: severity '{value}' is not an integer")]
    InvalidSeverity { line: usize, value: String },
}
