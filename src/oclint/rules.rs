//! OCLint rule catalog parser
//!
//! The catalog is plain text, one block per rule:
//!
//! ```text
//! deep nested block
//! ----------------
//!
//! Summary: Name: deep nested block
//! <p>This rule indicates blocks nested more deeply than the upper limit.</p>
//!
//! Category: size
//!
//! Severity: 3
//! ```
//!
//! Blocks are separated by `=` banner lines. The catalog is read in a
//! single pass: every line is classified, then folded into the rules
//! collected so far plus the rule currently being drafted.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::CatalogError;

/// Rule severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl Severity {
    /// Map a catalog severity code (0-4) onto a severity
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Severity::Info),
            1 => Some(Severity::Minor),
            2 => Some(Severity::Major),
            3 => Some(Severity::Critical),
            4 => Some(Severity::Blocker),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
            Severity::Blocker => "BLOCKER",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the issues a rule raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    #[default]
    CodeSmell,
    Bug,
    Vulnerability,
}

/// Rules that are not code smells
const RULE_TYPES: &[(&str, RuleType)] = &[
    // Basic
    ("broken null check", RuleType::Vulnerability),
    ("broken nil check", RuleType::Vulnerability),
    ("broken oddness check", RuleType::Bug),
    ("constant conditional operator", RuleType::Bug),
    ("double negative", RuleType::Bug),
    ("jumbled incrementer", RuleType::Bug),
    ("misplaced null check", RuleType::Vulnerability),
    ("misplaced nil check", RuleType::Vulnerability),
    ("return from finally block", RuleType::Vulnerability),
    ("throw exception from finally block", RuleType::Vulnerability),
    // Cocoa
    ("missing hash method", RuleType::Bug),
    ("missing call to base method", RuleType::Bug),
    // Convention
    ("base class destructor should be virtual or protected", RuleType::Bug),
    ("ill-placed default label in switch statement", RuleType::Bug),
    ("missing break in switch statement", RuleType::Bug),
];

impl RuleType {
    /// `BUG` and `VULNERABILITY` are recognised, anything else is a code smell
    pub fn from_name(name: &str) -> Self {
        match name {
            "BUG" => RuleType::Bug,
            "VULNERABILITY" => RuleType::Vulnerability,
            _ => RuleType::CodeSmell,
        }
    }

    /// Classification of a rule key
    pub fn for_rule(key: &str) -> Self {
        RULE_TYPES
            .iter()
            .find(|(rule, _)| *rule == key)
            .map(|(_, rule_type)| *rule_type)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::CodeSmell => "CODE_SMELL",
            RuleType::Bug => "BUG",
            RuleType::Vulnerability => "VULNERABILITY",
        }
    }
}

/// A rule described by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RuleDefinition {
    key: String,
    name: String,
    severity: Severity,
    description: String,
    #[serde(rename = "type")]
    rule_type: RuleType,
}

impl RuleDefinition {
    /// Lower-case phrase used by violation reports, e.g. `"deep nested block"`
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// HTML description
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }
}

#[derive(Debug, Clone, Default)]
struct RuleDraft {
    key: String,
    description: String,
    severity: Option<Severity>,
}

impl RuleDraft {
    fn titled(title: &str) -> Self {
        Self {
            key: title.to_string(),
            ..Default::default()
        }
    }

    fn build(self) -> RuleDefinition {
        RuleDefinition {
            name: capitalize(&self.key),
            rule_type: RuleType::for_rule(&self.key),
            severity: self.severity.unwrap_or_default(),
            description: self.description,
            key: self.key,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What a single catalog line means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    /// `=` banners and `Priority:` lines
    Ignored,
    /// Four or more dashes; the line before it is a rule title
    Separator,
    Summary(&'a str),
    /// Closes the rule being drafted
    Category,
    Severity(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    if line.starts_with('=') || line.starts_with("Priority:") {
        return LineKind::Ignored;
    }

    if line.chars().take_while(|c| *c == '-').count() >= 4 {
        return LineKind::Separator;
    }

    if let Some(summary) = line.strip_prefix("Summary:") {
        return LineKind::Summary(summary);
    }

    if line.starts_with("Category:") {
        return LineKind::Category;
    }

    if let Some(severity) = line.strip_prefix("Severity:") {
        return LineKind::Severity(severity.trim());
    }

    LineKind::Text(line)
}

/// The rule currently being read
#[derive(Debug, Default)]
enum Draft {
    #[default]
    Idle,
    Open(RuleDraft),
    /// The last rule was closed by its category line; trailing metadata
    /// still belongs to it.
    Committed,
}

#[derive(Debug, Default)]
struct CatalogState<'a> {
    rules: Vec<RuleDefinition>,
    draft: Draft,
    previous: Option<&'a str>,
    in_description: bool,
}

impl<'a> CatalogState<'a> {
    fn step(mut self, number: usize, line: &'a str) -> Result<Self, CatalogError> {
        match classify(line) {
            LineKind::Ignored => self.in_description = false,
            LineKind::Separator => self.open_rule(number),
            LineKind::Summary(summary) => {
                if let Draft::Open(draft) = &mut self.draft {
                    draft.description = format!("<p>{}</p>\n", summary);
                    self.in_description = true;
                }
            }
            LineKind::Category => {
                self.draft = match std::mem::take(&mut self.draft) {
                    Draft::Open(draft) => {
                        self.rules.push(draft.build());
                        Draft::Committed
                    }
                    other => other,
                };
                self.in_description = false;
            }
            LineKind::Severity(value) => {
                let severity = parse_severity(number, value)?;
                match &mut self.draft {
                    Draft::Open(draft) => draft.severity = Some(severity),
                    Draft::Committed => {
                        if let Some(rule) = self.rules.last_mut() {
                            rule.severity = severity;
                        }
                    }
                    Draft::Idle => tracing::debug!(line = number, "severity outside of a rule"),
                }
                self.in_description = false;
            }
            LineKind::Text(text) if text.trim().is_empty() => {}
            LineKind::Text(text) => {
                if let (true, Draft::Open(draft)) = (self.in_description, &mut self.draft) {
                    draft.description.push_str(text);
                    draft.description.push('\n');
                }
            }
        }

        self.previous = Some(line);
        Ok(self)
    }

    fn open_rule(&mut self, number: usize) {
        self.in_description = false;

        match self.previous.map(|previous| (previous, classify(previous))) {
            Some((title, LineKind::Text(_))) if !title.trim().is_empty() => {
                tracing::debug!(rule = title, "rule definition found");
                self.draft = Draft::Open(RuleDraft::titled(title));
            }
            _ => {
                tracing::warn!(line = number, "separator without a rule title");
                self.draft = Draft::Idle;
            }
        }
    }

    /// Rules in catalog order, identical definitions listed once
    fn finish(self) -> Vec<RuleDefinition> {
        let mut seen = HashSet::new();
        self.rules
            .into_iter()
            .filter(|rule| seen.insert(rule.clone()))
            .collect()
    }
}

fn parse_severity(line: usize, value: &str) -> Result<Severity, CatalogError> {
    let code = value.parse::<i64>().map_err(|_| CatalogError::InvalidSeverity {
        line,
        value: value.to_string(),
    })?;

    Severity::from_code(code).ok_or(CatalogError::SeverityOutOfRange { line, code })
}

/// Parse rule definitions from catalog lines
pub fn parse_rule_definitions<'a, I>(lines: I) -> Result<Vec<RuleDefinition>, CatalogError>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .try_fold(CatalogState::default(), |state, (index, line)| state.step(index + 1, line))
        .map(CatalogState::finish)
}

/// The rules of a parsed catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleCatalog {
    rules: Vec<RuleDefinition>,
}

impl RuleCatalog {
    pub fn parse_str(text: &str) -> Result<Self, CatalogError> {
        parse_rule_definitions(text.lines()).map(|rules| Self { rules })
    }

    /// Load a catalog file, or `None` when it is missing or malformed
    pub fn load(path: &Path) -> Option<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "no rule catalog exists at path");
                return None;
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "unable to read rule catalog");
                return None;
            }
        };

        match Self::parse_str(&text) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "malformed rule catalog");
                None
            }
        }
    }

    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    pub fn get(&self, key: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|rule| rule.key == key)
    }

    /// Keys of every rule in the catalog
    pub fn keys(&self) -> HashSet<String> {
        self.rules.iter().map(|rule| rule.key.clone()).collect()
    }
}
