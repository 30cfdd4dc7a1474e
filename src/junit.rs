//! JUnit/Surefire test report model and parser

use serde::Serialize;
use std::hash::{Hash, Hasher};

use crate::xml::{XmlDocument, XmlElement, XmlReportParser};

const TEST_SUITE: &str = "testsuite";
const TEST_CASE: &str = "testcase";
const FAILURE: &str = "failure";

/// Outcome of a single test case. Only successes are timed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestStatus {
    Success { duration: f64 },
    Failure,
}

/// A test method of a suite
///
/// Identity is the class and method name; status and duration are ignored,
/// so a suite never counts the same method twice.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    class_name: String,
    method_name: String,
    status: TestStatus,
}

impl TestCase {
    /// A passing test which ran for `duration` seconds
    pub fn success(class_name: &str, method_name: &str, duration: f64) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            status: TestStatus::Success { duration },
        }
    }

    pub fn failure(class_name: &str, method_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            status: TestStatus::Failure,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TestStatus::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failure
    }

    /// Whole milliseconds, truncated. Failures contribute nothing.
    pub fn duration_in_milliseconds(&self) -> u64 {
        match self.status {
            TestStatus::Success { duration } => (duration * 1000.0) as u64,
            TestStatus::Failure => 0,
        }
    }
}

impl PartialEq for TestCase {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.method_name == other.method_name
    }
}

impl Eq for TestCase {}

impl Hash for TestCase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_name.hash(state);
        self.method_name.hash(state);
    }
}

/// Test cases of one test class
#[derive(Debug, Clone, Eq, Serialize)]
pub struct TestSuite {
    class_name: String,
    test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Cases keep document order; a repeated case keeps its first occurrence
    pub fn new(class_name: &str, test_cases: impl IntoIterator<Item = TestCase>) -> Self {
        Self {
            class_name: class_name.to_string(),
            test_cases: unique(test_cases),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    pub fn number_of_tests(&self) -> usize {
        self.test_cases.len()
    }

    pub fn number_of_failed_tests(&self) -> usize {
        self.test_cases.iter().filter(|case| case.is_failed()).count()
    }

    /// Time spent in passing tests
    pub fn duration_in_milliseconds(&self) -> u64 {
        self.test_cases
            .iter()
            .filter(|case| case.is_success())
            .map(TestCase::duration_in_milliseconds)
            .sum()
    }
}

impl PartialEq for TestSuite {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && same_members(&self.test_cases, &other.test_cases)
    }
}

/// Test suites of one report file
#[derive(Debug, Clone, Eq, Serialize)]
pub struct TestReport {
    target_name: String,
    test_suites: Vec<TestSuite>,
}

impl TestReport {
    pub fn new(target_name: &str, test_suites: impl IntoIterator<Item = TestSuite>) -> Self {
        Self {
            target_name: target_name.to_string(),
            test_suites: unique(test_suites),
        }
    }

    /// Name of the test target (the report's root element)
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn test_suites(&self) -> &[TestSuite] {
        &self.test_suites
    }
}

impl PartialEq for TestReport {
    fn eq(&self, other: &Self) -> bool {
        self.target_name == other.target_name && same_members(&self.test_suites, &other.test_suites)
    }
}

fn unique<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// Set equality over already de-duplicated slices
fn same_members<T: PartialEq>(left: &[T], right: &[T]) -> bool {
    left.len() == right.len() && left.iter().all(|item| right.contains(item))
}

/// Parses JUnit XML test reports
#[derive(Debug, Clone, Copy, Default)]
pub struct JUnitParser;

impl XmlReportParser for JUnitParser {
    type Report = TestReport;

    fn parse_document(&self, document: &XmlDocument) -> TestReport {
        let root = document.root();
        let target_name = match root.attribute("name") {
            Some(name) => name,
            None => {
                tracing::warn!(root = root.name(), "test report has no target name");
                ""
            }
        };

        let suites = document
            .elements_by_tag(TEST_SUITE)
            .into_iter()
            .map(parse_test_suite);

        TestReport::new(target_name, suites)
    }
}

fn parse_test_suite(element: &XmlElement) -> TestSuite {
    let cases = element
        .descendants(TEST_CASE)
        .into_iter()
        .filter_map(parse_test_case);

    TestSuite::new(element.attribute_or_empty("name"), cases)
}

/// A case without child elements passed; a case holding exactly one
/// `<failure>` failed. Anything else (errors, skips) is not recorded.
fn parse_test_case(element: &XmlElement) -> Option<TestCase> {
    let class_name = element.attribute_or_empty("classname");
    let method_name = element.attribute_or_empty("name");

    if !element.has_children() {
        let time = element.attribute_or_empty("time");
        return match time.trim().parse::<f64>() {
            Ok(duration) if duration.is_finite() => {
                if duration < 0.0 {
                    tracing::warn!(
                        class_name,
                        method_name,
                        time,
                        "test case reported with negative time"
                    );
                }
                Some(TestCase::success(class_name, method_name, duration))
            }
            _ => {
                tracing::warn!(
                    class_name,
                    method_name,
                    time,
                    "skipping test case with invalid time"
                );
                None
            }
        };
    }

    if element.descendants(FAILURE).len() == 1 {
        return Some(TestCase::failure(class_name, method_name));
    }

    tracing::error!(class_name, method_name, "unable to parse test case element");
    None
}
