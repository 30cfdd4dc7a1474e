//! Report sensors
//!
//! One sensor per report format. A sensor locates its reports, parses
//! them, resolves every record against the project index and hands the
//! resolved measures to the sink.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::coverage::{CoberturaParser, CoveragePackage};
use crate::finder::ReportFinder;
use crate::index::{FileIndex, ProjectFiles};
use crate::junit::JUnitParser;
use crate::lizard::LizardParser;
use crate::oclint::{OclintParser, RuleCatalog, Violation};
use crate::persist::{Measure, MeasureSink};
use crate::reconcile::Reconciler;
use crate::xml::XmlReportParser;

/// Outcome of one sensor run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SensorSummary {
    pub sensor: String,
    /// Report files read
    pub reports: usize,
    /// Per-file records found in the reports
    pub records: usize,
    /// Records resolved and saved
    pub saved: usize,
    /// Records dropped as unresolved or inactive
    pub dropped: usize,
}

impl SensorSummary {
    fn new(sensor: &str) -> Self {
        Self {
            sensor: sensor.to_string(),
            ..Default::default()
        }
    }

    fn record(&mut self, saved: bool) {
        self.records += 1;
        if saved {
            self.saved += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// What a sensor works with
pub struct SensorContext<'a> {
    finder: ReportFinder,
    reconciler: Reconciler<'a>,
    sink: &'a mut dyn MeasureSink,
}

impl<'a> SensorContext<'a> {
    pub fn new(index: &'a dyn FileIndex, sink: &'a mut dyn MeasureSink) -> Self {
        Self {
            finder: ReportFinder::new(index.base_dir()),
            reconciler: Reconciler::new(index),
            sink,
        }
    }

    pub fn finder(&self) -> &ReportFinder {
        &self.finder
    }

    pub fn reconciler(&self) -> &Reconciler<'a> {
        &self.reconciler
    }
}

pub trait Sensor {
    fn name(&self) -> &str;

    fn execute(&self, context: &mut SensorContext) -> SensorSummary;
}

/// Line and branch coverage from Cobertura reports
pub struct CoverageSensor {
    pattern: String,
}

impl CoverageSensor {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl Sensor for CoverageSensor {
    fn name(&self) -> &str {
        "coverage"
    }

    fn execute(&self, context: &mut SensorContext) -> SensorSummary {
        let mut summary = SensorSummary::new(self.name());

        let mut packages: Vec<CoveragePackage> = Vec::new();
        for report in context.finder.find_matching(&self.pattern) {
            tracing::info!(report = %report.display(), "processing coverage report");
            summary.reports += 1;
            packages.extend(CoberturaParser.parse(&report).unwrap_or_default());
        }

        for class in packages.iter().flat_map(|package| package.classes()) {
            let Some(file) = context.reconciler.resolve_path(class.filename()) else {
                summary.record(false);
                continue;
            };

            for line in class.lines().filter(|line| line.number() > 0) {
                let conditions = line
                    .has_conditions()
                    .then(|| (line.conditions(), line.conditions_covered()));
                context.sink.save(
                    file,
                    Measure::LineCoverage {
                        line: line.number(),
                        hits: line.hits(),
                        conditions,
                    },
                );
            }
            summary.record(true);
        }

        summary
    }
}

/// Test counts and durations from JUnit reports
pub struct TestsSensor {
    pattern: String,
}

impl TestsSensor {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl Sensor for TestsSensor {
    fn name(&self) -> &str {
        "tests"
    }

    fn execute(&self, context: &mut SensorContext) -> SensorSummary {
        let mut summary = SensorSummary::new(self.name());

        for report in context.finder.find_matching(&self.pattern) {
            tracing::info!(report = %report.display(), "processing test report");
            summary.reports += 1;

            let Some(test_report) = JUnitParser.parse(&report) else {
                continue;
            };

            for suite in test_report.test_suites() {
                let Some(file) = context.reconciler.resolve_class(suite.class_name()) else {
                    summary.record(false);
                    continue;
                };

                context.sink.save(
                    file,
                    Measure::Tests {
                        tests: suite.number_of_tests(),
                        failures: suite.number_of_failed_tests(),
                        duration_ms: suite.duration_in_milliseconds(),
                    },
                );
                summary.record(true);
            }
        }

        summary
    }
}

/// Rule violations from the OCLint report
pub struct ViolationsSensor {
    pattern: String,
    /// Rules issues may be raised for; unrestricted when unknown
    active_rules: Option<HashSet<String>>,
}

impl ViolationsSensor {
    pub fn new(pattern: &str, active_rules: Option<HashSet<String>>) -> Self {
        Self {
            pattern: pattern.to_string(),
            active_rules,
        }
    }

    fn is_active(&self, violation: &Violation) -> bool {
        self.active_rules
            .as_ref()
            .map_or(true, |rules| rules.contains(violation.rule()))
    }
}

impl Sensor for ViolationsSensor {
    fn name(&self) -> &str {
        "violations"
    }

    fn execute(&self, context: &mut SensorContext) -> SensorSummary {
        let mut summary = SensorSummary::new(self.name());

        let Some(report) = context.finder.find_first_matching(&self.pattern) else {
            tracing::info!(pattern = %self.pattern, "no violation report found");
            return summary;
        };

        tracing::info!(report = %report.display(), "processing violation report");
        summary.reports += 1;
        let violations = OclintParser.parse(&report).unwrap_or_default();

        for (path, group) in group_by_path(&violations) {
            let file = context.reconciler.resolve_path(path);

            for violation in group {
                let Some(file) = file else {
                    summary.record(false);
                    continue;
                };

                if !self.is_active(violation) {
                    tracing::warn!(
                        rule = violation.rule(),
                        path,
                        "rule is not active, issue dropped"
                    );
                    summary.record(false);
                    continue;
                }

                context.sink.save(
                    file,
                    Measure::Issue {
                        rule: violation.rule().to_string(),
                        line: violation.start_line(),
                        message: violation.message().to_string(),
                    },
                );
                summary.record(true);
            }
        }

        summary
    }
}

/// Violations grouped by path, paths in first-seen order
fn group_by_path(violations: &[Violation]) -> Vec<(&str, Vec<&Violation>)> {
    let mut groups: Vec<(&str, Vec<&Violation>)> = Vec::new();
    for violation in violations {
        match groups.iter_mut().find(|(path, _)| *path == violation.path()) {
            Some((_, group)) => group.push(violation),
            None => groups.push((violation.path(), vec![violation])),
        }
    }
    groups
}

/// File complexity from the Lizard report
pub struct ComplexitySensor {
    pattern: String,
}

impl ComplexitySensor {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl Sensor for ComplexitySensor {
    fn name(&self) -> &str {
        "complexity"
    }

    fn execute(&self, context: &mut SensorContext) -> SensorSummary {
        let mut summary = SensorSummary::new(self.name());

        let Some(report) = context.finder.find_first_matching(&self.pattern) else {
            tracing::info!(pattern = %self.pattern, "no complexity report found");
            return summary;
        };

        tracing::info!(report = %report.display(), "processing complexity report");
        summary.reports += 1;

        for measure in LizardParser.parse(&report).unwrap_or_default() {
            let Some(file) = context.reconciler.resolve_path(measure.path()) else {
                tracing::warn!(path = measure.path(), "file not included in analysis");
                summary.record(false);
                continue;
            };

            context.sink.save(
                file,
                Measure::Complexity {
                    complexity: measure.complexity(),
                    functions: measure.functions(),
                },
            );
            summary.record(true);
        }

        summary
    }
}

/// Run every sensor over the project at `base_dir`
pub fn analyze(config: &Config, base_dir: &Path, sink: &mut dyn MeasureSink) -> Vec<SensorSummary> {
    let index = ProjectFiles::scan(base_dir, &config.project.sources, &config.project.exclude);
    tracing::info!(project = %config.project.name, files = index.len(), "analyzing project");

    let active_rules = config
        .reports
        .rules
        .as_ref()
        .and_then(|rules| RuleCatalog::load(&index.base_dir().join(rules)))
        .map(|catalog| catalog.keys());

    let sensors: Vec<Box<dyn Sensor>> = vec![
        Box::new(CoverageSensor::new(&config.reports.coverage)),
        Box::new(TestsSensor::new(&config.reports.tests)),
        Box::new(ViolationsSensor::new(&config.reports.oclint, active_rules)),
        Box::new(ComplexitySensor::new(&config.reports.lizard)),
    ];

    let mut context = SensorContext::new(&index, sink);
    sensors
        .iter()
        .map(|sensor| {
            let summary = sensor.execute(&mut context);
            tracing::info!(
                sensor = sensor.name(),
                saved = summary.saved,
                dropped = summary.dropped,
                "sensor finished"
            );
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    const COVERAGE: &str = r#"<?xml version="1.0"?>
<coverage>
    <packages>
        <package name="App">
            <classes>
                <class name="AppDelegate" filename="App/AppDelegate.m">
                    <lines>
                        <line number="0" hits="1"/>
                        <line number="10" hits="3" branch="true" condition-coverage="50% (1/2)"/>
                        <line number="11" hits="0"/>
                    </lines>
                </class>
                <class name="Generated" filename="DerivedData/Generated.m">
                    <lines><line number="1" hits="1"/></lines>
                </class>
            </classes>
        </package>
    </packages>
</coverage>"#;

    const TESTS: &str = r#"<testsuites name="AppTests.xctest">
    <testsuite name="AppDelegateTests">
        <testcase classname="AppDelegateTests" name="testLaunch" time="0.003"/>
        <testcase classname="AppDelegateTests" name="testTerminate" time="0.001"/>
    </testsuite>
    <testsuite name="NSString_UtilsTests">
        <testcase classname="NSString_UtilsTests" name="testTrim" time="0.002"/>
        <testcase classname="NSString_UtilsTests" name="testSplit" time="0.004"><failure/></testcase>
    </testsuite>
    <testsuite name="UnknownTests">
        <testcase classname="UnknownTests" name="testNothing" time="0.001"/>
    </testsuite>
</testsuites>"#;

    const OCLINT: &str = r#"<oclint><violations>
    <violation path="App/AppDelegate.m" startline="12" rule="long line" message="Line too long"/>
    <violation path="App/Unknown.m" startline="3" rule="long line" message="Line too long"/>
    <violation path="App/AppDelegate.m" startline="20" rule="deep nested block" message="Too deep"/>
</violations></oclint>"#;

    const LIZARD: &str = r#"<cppncss><measure type="File">
    <item name="App/AppDelegate.m"><value>1</value><value>29</value><value>6</value><value>4</value></item>
    <item name="App/Missing.m"><value>2</value><value>10</value><value>1</value><value>1</value></item>
</measure></cppncss>"#;

    const RULES: &str = "long line\n\
        ---------\n\
        \n\
        Summary: Name: long line\n\
        \n\
        Category: size\n\
        \n\
        Severity: 2\n";

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        write_project(temp_dir.path());
        temp_dir
    }

    fn write_project(base: &Path) {
        crate::logging::init_test_logging();

        write(base, "App/AppDelegate.m", "");
        write(base, "App/AppDelegate.h", "");
        write(base, "Tests/AppDelegateTests.m", "");
        write(base, "Tests/NSString+UtilsTests.m", "");
        write(base, "Tests/NSString+UtilsTests.h", "");
        write(base, "DerivedData/Generated.m", "");

        write(base, "sonar-reports/app-coverage.xml", COVERAGE);
        write(base, "sonar-reports/TEST-AppTests.xml", TESTS);
        write(base, "sonar-reports/app-oclint.xml", OCLINT);
        write(base, "sonar-reports/lizard-report.xml", LIZARD);
    }

    #[test]
    fn test_analyze_project() {
        let temp_dir = project();
        let config = Config::for_project("App");
        let mut store = MemoryStore::new();

        let summaries = analyze(&config, temp_dir.path(), &mut store);
        let names: Vec<&str> = summaries.iter().map(|s| s.sensor.as_str()).collect();
        assert_eq!(names, vec!["coverage", "tests", "violations", "complexity"]);

        // Line 0 is never saved, excluded files do not resolve
        let coverage: Vec<&Measure> = store
            .measures_for("App/AppDelegate.m")
            .filter(|m| matches!(m, Measure::LineCoverage { .. }))
            .collect();
        assert_eq!(
            coverage,
            vec![
                &Measure::LineCoverage { line: 10, hits: 3, conditions: Some((2, 1)) },
                &Measure::LineCoverage { line: 11, hits: 0, conditions: None },
            ]
        );
        assert_eq!(
            summaries[0],
            SensorSummary {
                sensor: "coverage".to_string(),
                reports: 1,
                records: 2,
                saved: 1,
                dropped: 1,
            }
        );

        let tests: Vec<&Measure> = store.measures_for("Tests/NSString+UtilsTests.m").collect();
        assert_eq!(
            tests,
            vec![&Measure::Tests { tests: 2, failures: 1, duration_ms: 2 }]
        );
        let tests: Vec<&Measure> = store.measures_for("Tests/AppDelegateTests.m").collect();
        assert_eq!(
            tests,
            vec![&Measure::Tests { tests: 2, failures: 0, duration_ms: 4 }]
        );
        assert_eq!(summaries[1].dropped, 1);

        assert_eq!(summaries[2].saved, 2);
        assert_eq!(summaries[2].dropped, 1);

        let complexity = Measure::Complexity { complexity: 6, functions: 4 };
        assert!(store.measures_for("App/AppDelegate.m").any(|m| *m == complexity));
        assert_eq!(summaries[3].dropped, 1);
    }

    #[test]
    fn test_analyze_relative_project_dir() {
        let temp_dir = TempDir::new_in(".").unwrap();
        let relative = Path::new(".").join(temp_dir.path().file_name().unwrap());
        write_project(&relative);
        write(&relative, "oclint-rules.txt", RULES);

        let mut config = Config::for_project("App");
        config.reports.rules = Some("oclint-rules.txt".to_string());
        let mut store = MemoryStore::new();

        let summaries = analyze(&config, &relative, &mut store);

        assert!(summaries.iter().all(|s| s.reports == 1));
        assert_eq!(summaries[0].saved, 1);
        assert_eq!(summaries[1].saved, 2);
        assert_eq!(summaries[2].saved, 1);
        assert_eq!(summaries[3].saved, 1);
        assert!(store.measures_for("App/AppDelegate.m").next().is_some());
    }

    #[test]
    fn test_inactive_rules_are_dropped() {
        let temp_dir = project();
        write(temp_dir.path(), "oclint-rules.txt", RULES);

        let mut config = Config::for_project("App");
        config.reports.rules = Some("oclint-rules.txt".to_string());
        let mut store = MemoryStore::new();

        let summaries = analyze(&config, temp_dir.path(), &mut store);

        let issues: Vec<&Measure> = store
            .measures()
            .iter()
            .map(|stored| &stored.measure)
            .filter(|m| matches!(m, Measure::Issue { .. }))
            .collect();
        assert_eq!(
            issues,
            vec![&Measure::Issue {
                rule: "long line".to_string(),
                line: 12,
                message: "Line too long".to_string(),
            }]
        );
        assert_eq!(summaries[2].saved, 1);
        assert_eq!(summaries[2].dropped, 2);
    }

    #[test]
    fn test_missing_reports_are_not_fatal() {
        crate::logging::init_test_logging();
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "App/Main.m", "");
        write(temp_dir.path(), "sonar-reports/broken-coverage.xml", "<coverage><packages>");

        let mut store = MemoryStore::new();
        let summaries = analyze(&Config::for_project("App"), temp_dir.path(), &mut store);

        assert!(store.is_empty());
        assert_eq!(summaries[0].reports, 1);
        assert!(summaries.iter().all(|s| s.saved == 0));
    }

    #[test]
    fn test_group_by_path() {
        let violations = vec![
            Violation::new("B.m", 1, "r", ""),
            Violation::new("A.m", 2, "r", ""),
            Violation::new("B.m", 3, "r", ""),
        ];

        let groups = group_by_path(&violations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "B.m");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "A.m");
    }
}
