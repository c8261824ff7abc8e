use std::fmt::Write;

use colored::Colorize;
use serde::Serialize;

use crate::scanner::ScanResult;

const RULE_BAR: &str =
    "────────────────────────────────────────────────────";

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Produce a report string covering all scanned files in the desired format.
pub fn render_report(results: &[ScanResult], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => render_text(results),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&JsonReport::from(results))?;
            out.push('\n');
            Ok(out)
        }
    }
}

fn render_text(results: &[ScanResult]) -> anyhow::Result<String> {
    let mut out = String::new();
    let mut counts = SeverityCounts::default();

    for result in results {
        if result.findings.is_empty() {
            writeln!(out, "✓ {} - No issues found", result.file)?;
            continue;
        }

        writeln!(out)?;
        writeln!(out, "{RULE_BAR}")?;
        writeln!(out, "{}", result.file)?;
        writeln!(out, "{RULE_BAR}")?;

        for finding in &result.findings {
            counts.record(&finding.severity);
            writeln!(
                out,
                "\n{} [{}]",
                finding.name,
                paint_severity(&finding.severity)
            )?;
            writeln!(out, "   ID: {}", finding.rule_id)?;
            writeln!(out, "   {}", finding.description)?;
            if let Some(location) = &finding.location {
                writeln!(out, "   Location: {location}")?;
            }
            writeln!(out, "   Fix: {}", finding.recommendation)?;
            if !finding.references.is_empty() {
                writeln!(out, "   References:")?;
                for reference in &finding.references {
                    writeln!(out, "     - {reference}")?;
                }
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{RULE_BAR}")?;
    writeln!(out, "Summary")?;
    writeln!(out, "{RULE_BAR}")?;
    writeln!(out, "Total files scanned: {}", results.len())?;
    writeln!(out, "Total findings: {}", counts.total)?;
    if counts.critical > 0 {
        writeln!(out, "  {}: {}", "Critical".red().bold(), counts.critical)?;
    }
    if counts.high > 0 {
        writeln!(out, "  {}: {}", "High".red(), counts.high)?;
    }
    if counts.medium > 0 {
        writeln!(out, "  {}: {}", "Medium".yellow(), counts.medium)?;
    }
    if counts.low > 0 {
        writeln!(out, "  {}: {}", "Low".blue(), counts.low)?;
    }

    Ok(out)
}

fn paint_severity(severity: &str) -> String {
    match severity {
        "CRITICAL" => severity.red().bold().to_string(),
        "HIGH" => severity.red().to_string(),
        "MEDIUM" => severity.yellow().to_string(),
        "LOW" => severity.blue().to_string(),
        other => other.to_string(),
    }
}

#[derive(Default)]
struct SeverityCounts {
    total: usize,
    critical: usize,
    high: usize,
    medium: usize,
    low: usize,
}

impl SeverityCounts {
    fn record(&mut self, severity: &str) {
        self.total += 1;
        match severity {
            "CRITICAL" => self.critical += 1,
            "HIGH" => self.high += 1,
            "MEDIUM" => self.medium += 1,
            "LOW" => self.low += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    results: &'a [ScanResult],
}

impl<'a> From<&'a [ScanResult]> for JsonReport<'a> {
    fn from(results: &'a [ScanResult]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            results,
        }
    }
}
