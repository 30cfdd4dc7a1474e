use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::persist::StoredMeasure;
use crate::sensor::SensorSummary;

/// Everything one analysis produced
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub sensors: Vec<SensorSummary>,
    pub measures: Vec<StoredMeasure>,
}

impl AnalysisReport {
    pub fn new(project: &str, sensors: Vec<SensorSummary>, measures: Vec<StoredMeasure>) -> Self {
        Self {
            project: project.to_string(),
            generated_at: Utc::now(),
            sensors,
            measures,
        }
    }

    /// Number of distinct files that received a measure
    pub fn file_count(&self) -> usize {
        let mut paths: Vec<&str> = self.measures.iter().map(|m| m.path.as_str()).collect();
        paths.sort_unstable();
        paths.dedup();
        paths.len()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize analysis report")
    }

    /// Write the report as JSON
    pub fn write(&self, output_path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(output_path, json)
            .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
        Ok(())
    }
}

/// Print a per-sensor summary table
pub fn print_summary(report: &AnalysisReport) {
    println!("\n{} {}", "📦".cyan(), report.project.bold());
    println!("{}", "━".repeat(50).dimmed());

    for summary in &report.sensors {
        let status = if summary.reports == 0 {
            "no report".dimmed()
        } else if summary.dropped == 0 {
            "✓".green()
        } else {
            "!".yellow()
        };

        println!(
            "  {} {:<12} {} {}  {} {}  {} {}",
            status,
            summary.sensor.cyan(),
            "reports:".dimmed(),
            summary.reports,
            "saved:".dimmed(),
            summary.saved.to_string().green(),
            "dropped:".dimmed(),
            if summary.dropped > 0 {
                summary.dropped.to_string().yellow()
            } else {
                summary.dropped.to_string().normal()
            },
        );
    }

    println!("{}", "━".repeat(50).dimmed());
    println!(
        "  {} measures on {} files, {}",
        report.measures.len().to_string().bold(),
        report.file_count().to_string().bold(),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
    );
}
