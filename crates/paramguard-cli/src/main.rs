use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paramguard_core::{
    render_report, DefaultScanner, FileRuleRepository, OutputFormat, RuleRepository,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "paramguard",
    author,
    version,
    about = "LLM Configuration Security Scanner"
)]
struct Cli {
    /// Rule pack to evaluate (YAML)
    #[arg(
        long = "rules",
        value_name = "FILE",
        default_value = "rules.yaml",
        global = true
    )]
    rules: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan configuration files for insecure settings
    Scan {
        /// Config files to scan (JSON, YAML, TOML or KEY=VALUE)
        #[arg(required = true, value_name = "CONFIG")]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// List all loaded rules
    ListRules {
        /// Emit rules as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan { files, format } => scan(&cli.rules, &files, format),
        Commands::ListRules { json } => {
            list_rules(&cli.rules, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn scan(rules: &Path, files: &[PathBuf], format: Format) -> Result<ExitCode> {
    let repo = Arc::new(FileRuleRepository::new(rules));
    let rule_set = repo
        .load_rules()
        .with_context(|| format!("failed to load rules from {}", rules.display()))?;
    debug!(rules = rule_set.rules.len(), "rule pack loaded");
    let scanner = DefaultScanner::new(repo);

    // First parse failure aborts the whole run.
    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let result = scanner
            .scan_file(file)
            .with_context(|| format!("failed to scan {}", file.display()))?;
        results.push(result);
    }

    print!("{}", render_report(&results, format.into())?);

    let has_findings = results.iter().any(|result| !result.findings.is_empty());
    Ok(if has_findings {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn list_rules(rules: &Path, json: bool) -> Result<()> {
    let repo = FileRuleRepository::new(rules);
    let rule_set = repo
        .load_rules()
        .with_context(|| format!("failed to load rules from {}", rules.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rule_set.rules)?);
        return Ok(());
    }

    println!(
        "{} rule(s) loaded from {} (pack version {})",
        rule_set.rules.len(),
        rules.display(),
        rule_set.version
    );
    for rule in &rule_set.rules {
        println!(
            "- {id:<14} [{severity:<8}] {category:<14} :: {name}",
            id = rule.id,
            severity = rule.severity,
            category = rule.category,
            name = rule.name
        );
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
