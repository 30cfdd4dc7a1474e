use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "objc-reports.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: Project,
    #[serde(default)]
    pub reports: Reports,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    /// Globs selecting the tracked source files
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Report locations, as globs relative to the project directory
#[derive(Debug, Clone, Deserialize)]
pub struct Reports {
    #[serde(default = "default_coverage")]
    pub coverage: String,
    #[serde(default = "default_tests")]
    pub tests: String,
    /// Only the first match is read
    #[serde(default = "default_oclint")]
    pub oclint: String,
    /// Only the first match is read
    #[serde(default = "default_lizard")]
    pub lizard: String,
    /// OCLint rule catalog; when set, violations of unknown rules are dropped
    #[serde(default)]
    pub rules: Option<String>,
}

impl Default for Reports {
    fn default() -> Self {
        Self {
            coverage: default_coverage(),
            tests: default_tests(),
            oclint: default_oclint(),
            lizard: default_lizard(),
            rules: None,
        }
    }
}

fn default_sources() -> Vec<String> {
    vec!["**/*.m".to_string(), "**/*.mm".to_string(), "**/*.h".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["Pods/**".to_string(), "build/**".to_string(), "DerivedData/**".to_string()]
}

fn default_coverage() -> String {
    "sonar-reports/*coverage*.xml".to_string()
}

fn default_tests() -> String {
    "sonar-reports/TEST-*.xml".to_string()
}

fn default_oclint() -> String {
    "sonar-reports/*oclint.xml".to_string()
}

fn default_lizard() -> String {
    "sonar-reports/lizard-report.xml".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Default configuration for a project
    pub fn for_project(name: &str) -> Self {
        Self {
            project: Project {
                name: name.to_string(),
                sources: default_sources(),
                exclude: default_exclude(),
            },
            reports: Reports::default(),
        }
    }

    /// Load `objc-reports.toml` from the project directory, or fall back to
    /// defaults named after the directory
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if path.exists() {
            return Self::load(&path);
        }

        let name = project_dir
            .canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        tracing::debug!(project = %name, "no config file found, using defaults");
        Ok(Self::for_project(&name))
    }

    fn validate(&self) -> Result<()> {
        let patterns = self
            .project
            .sources
            .iter()
            .map(|pattern| ("project.sources", pattern))
            .chain(self.project.exclude.iter().map(|pattern| ("project.exclude", pattern)))
            .chain([
                ("reports.coverage", &self.reports.coverage),
                ("reports.tests", &self.reports.tests),
                ("reports.oclint", &self.reports.oclint),
                ("reports.lizard", &self.reports.lizard),
            ]);

        for (key, pattern) in patterns {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid pattern '{}' in {}", pattern, key))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[project]
name = "test-project"
sources = ["App/**/*.m"]

[reports]
coverage = "build/reports/coverage.xml"
rules = "oclint-rules.txt"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.project.name, "test-project");
        assert_eq!(config.project.sources, vec!["App/**/*.m"]);
        assert_eq!(config.project.exclude, default_exclude());
        assert_eq!(config.reports.coverage, "build/reports/coverage.xml");
        assert_eq!(config.reports.tests, "sonar-reports/TEST-*.xml");
        assert_eq!(config.reports.rules.as_deref(), Some("oclint-rules.txt"));
    }

    #[test]
    fn test_reports_section_is_optional() {
        let config: Config = toml::from_str("[project]\nname = \"app\"\n").unwrap();
        assert_eq!(config.reports.lizard, "sonar-reports/lizard-report.xml");
        assert_eq!(config.reports.oclint, "sonar-reports/*oclint.xml");
        assert!(config.reports.rules.is_none());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "[project]\nname = \"app\"\n[reports]\ntests = \"TEST-[.xml\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("reports.tests"));
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("MyApp");
        fs::create_dir(&project).unwrap();

        let config = Config::load_or_default(&project).unwrap();
        assert_eq!(config.project.name, "MyApp");
        assert_eq!(config.project.sources, default_sources());

        fs::write(project.join(CONFIG_FILE), "[project]\nname = \"Configured\"\n").unwrap();
        let config = Config::load_or_default(&project).unwrap();
        assert_eq!(config.project.name, "Configured");
    }
}
