//! objc-reports - Objective-C build report ingestion
//!
//! A library for reading the reports an Objective-C build leaves behind and
//! attaching their results to project files:
//! - Cobertura line and branch coverage
//! - JUnit test counts and durations
//! - OCLint violations, filtered by an OCLint rule catalog
//! - Lizard file complexity

pub mod config;
pub mod coverage;
pub mod error;
pub mod finder;
pub mod index;
pub mod junit;
pub mod lizard;
pub mod logging;
pub mod oclint;
pub mod persist;
pub mod reconcile;
pub mod report;
pub mod sensor;
pub mod xml;

pub use config::Config;
pub use error::{CatalogError, ReportError};
pub use finder::ReportFinder;
pub use index::{FileIndex, InputFile, ProjectFiles};
pub use persist::{Measure, MeasureSink, MemoryStore, StoredMeasure};
pub use reconcile::Reconciler;
pub use report::AnalysisReport;
pub use sensor::{analyze, Sensor, SensorContext, SensorSummary};
pub use xml::{XmlDocument, XmlElement, XmlReportParser};
