//! Cobertura XML format parser

use crate::xml::{XmlDocument, XmlElement, XmlReportParser};

use super::{CoverageClass, CoverageLine, CoveragePackage};

const PACKAGE: &str = "package";
const CLASS: &str = "class";
const LINE: &str = "line";

/// Parses Cobertura coverage reports into packages, in document order
#[derive(Debug, Clone, Copy, Default)]
pub struct CoberturaParser;

impl XmlReportParser for CoberturaParser {
    type Report = Vec<CoveragePackage>;

    fn parse_document(&self, document: &XmlDocument) -> Vec<CoveragePackage> {
        document
            .elements_by_tag(PACKAGE)
            .into_iter()
            .map(parse_package)
            .collect()
    }
}

fn parse_package(element: &XmlElement) -> CoveragePackage {
    let classes = element.descendants(CLASS).into_iter().map(parse_class);
    CoveragePackage::new(element.attribute_or_empty("name"), classes)
}

fn parse_class(element: &XmlElement) -> CoverageClass {
    let filename = element.attribute_or_empty("filename");
    let lines = element
        .descendants(LINE)
        .into_iter()
        .filter_map(|line| parse_line(filename, line));

    CoverageClass::new(filename, lines)
}

/// A line with an unreadable number or hit count is skipped, the rest of
/// the class is kept.
fn parse_line(filename: &str, element: &XmlElement) -> Option<CoverageLine> {
    let number = element.parse_attribute::<u32>("number");
    let hits = element.parse_attribute::<u64>("hits");

    let (number, hits) = match (number, hits) {
        (Some(number), Some(hits)) => (number, hits),
        _ => {
            tracing::warn!(
                filename,
                number = element.attribute_or_empty("number"),
                hits = element.attribute_or_empty("hits"),
                "skipping coverage line with invalid number or hits"
            );
            return None;
        }
    };

    match parse_condition_coverage(element) {
        Some((conditions, covered)) => Some(CoverageLine::with_conditions(
            number, hits, conditions, covered,
        )),
        None => Some(CoverageLine::new(number, hits)),
    }
}

/// Branch totals of a line as `(conditions, conditions_covered)`.
///
/// Only lines flagged `branch="true"` carry them; the value is read from
/// `condition-coverage="50% (1/2)"`.
fn parse_condition_coverage(element: &XmlElement) -> Option<(u32, u32)> {
    if !element.attribute_or_empty("branch").eq_ignore_ascii_case("true") {
        return None;
    }

    let raw = element.attribute_or_empty("condition-coverage");
    if raw.is_empty() {
        tracing::warn!(
            line = element.attribute_or_empty("number"),
            "branch line has no condition coverage"
        );
        return None;
    }

    let Some((covered, conditions)) = split_condition_values(raw) else {
        tracing::warn!(value = raw, "unable to read condition coverage");
        return None;
    };

    let (covered, conditions) = match (covered.parse::<u32>(), conditions.parse::<u32>()) {
        (Ok(covered), Ok(conditions)) => (covered, conditions),
        _ => {
            tracing::warn!(value = raw, "unable to parse condition coverage");
            return None;
        }
    };

    if conditions == 0 {
        tracing::warn!(
            value = raw,
            "condition coverage exists but number of conditions is zero"
        );
        return None;
    }

    if covered > conditions {
        tracing::warn!(
            value = raw,
            "number of covered conditions is higher than the number of conditions"
        );
        return None;
    }

    Some((conditions, covered))
}

/// The two values of the first parenthesised `a/b` pair, e.g. `("1", "2")`
/// for `"50% (1/2)"`.
fn split_condition_values(raw: &str) -> Option<(&str, &str)> {
    let start = raw.find('(')? + 1;
    let end = start + raw[start..].find(')')?;

    let values: Vec<&str> = raw[start..end].split('/').map(str::trim).collect();
    match values.as_slice() {
        [covered, conditions] if !covered.is_empty() && !conditions.is_empty() => {
            Some((*covered, *conditions))
        }
        _ => None,
    }
}
