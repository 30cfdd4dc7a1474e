use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use objc_reports::config::{Config, CONFIG_FILE};
use objc_reports::oclint::{RuleCatalog, Severity};
use objc_reports::report::{self, AnalysisReport};
use objc_reports::{analyze, logging, MemoryStore, ReportFinder};

#[derive(Parser)]
#[command(name = "objc-reports")]
#[command(about = "Ingest Objective-C coverage, test, lint and complexity reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: <project>/objc-reports.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every report and attach the results to project files
    Analyze {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Write the analysis as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse an OCLint rule catalog
    Rules {
        catalog: PathBuf,

        /// Print the rules as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the report files a pattern matches
    Locate {
        pattern: String,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { project, output } => {
            cmd_analyze(cli.config.as_deref(), &project, output.as_deref())
        }
        Commands::Rules { catalog, json } => cmd_rules(&catalog, json),
        Commands::Locate { pattern, project } => cmd_locate(&pattern, &project),
    }
}

fn load_config(config_path: Option<&Path>, project: &Path) -> Result<Config> {
    match config_path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Could not load {}", path.display()))
        }
        None => Config::load_or_default(project)
            .with_context(|| format!("Could not load {}", project.join(CONFIG_FILE).display())),
    }
}

fn cmd_analyze(config_path: Option<&Path>, project: &Path, output: Option<&Path>) -> Result<()> {
    if !project.is_dir() {
        anyhow::bail!("Project directory '{}' does not exist", project.display());
    }

    let config = load_config(config_path, project)?;

    let mut store = MemoryStore::new();
    let summaries = analyze(&config, project, &mut store);
    let analysis = AnalysisReport::new(&config.project.name, summaries, store.into_measures());

    report::print_summary(&analysis);

    if let Some(output) = output {
        analysis.write(output)?;
        println!(
            "\n{} Report written: {}",
            "📊".cyan(),
            output.display().to_string().green()
        );
    }

    Ok(())
}

fn cmd_rules(catalog_path: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(catalog_path)
        .with_context(|| format!("Failed to read rule catalog: {}", catalog_path.display()))?;
    let catalog = RuleCatalog::parse_str(&text)
        .with_context(|| format!("Malformed rule catalog: {}", catalog_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.rules())?);
        return Ok(());
    }

    if catalog.rules().is_empty() {
        println!("  {}", "No rules defined".dimmed());
        return Ok(());
    }

    println!("{}", "Rules:".bold());
    for rule in catalog.rules() {
        let severity = rule.severity().to_string();
        let severity = match rule.severity() {
            s if s >= Severity::Critical => severity.red(),
            Severity::Major => severity.yellow(),
            _ => severity.normal(),
        };

        println!(
            "  {} {:<50} {:<9} {}",
            "•".green(),
            rule.name().cyan(),
            severity,
            rule.rule_type().as_str().magenta()
        );
    }
    println!("\n  {} rules", catalog.rules().len().to_string().bold());

    Ok(())
}

fn cmd_locate(pattern: &str, project: &Path) -> Result<()> {
    let finder = ReportFinder::new(project);
    let mut reports = finder.find_matching(pattern);
    reports.sort();

    if reports.is_empty() {
        println!("  {}", "No reports found".dimmed());
        return Ok(());
    }

    for path in reports {
        println!("  {} {}", "•".green(), path.display());
    }

    Ok(())
}
