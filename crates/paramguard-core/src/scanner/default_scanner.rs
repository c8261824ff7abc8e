use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, instrument};

use super::{evaluate, Finding, RuleRepository, ScanResult, Scanner};
use crate::config::Config;
use crate::parser;

/// Scanner implementation backed by a rule repository.
///
/// Each file is processed independently: parse into a [`Config`], then
/// evaluate every rule in pack order, collecting findings in that order.
pub struct DefaultScanner<R: RuleRepository> {
    rule_repo: Arc<R>,
}

impl<R: RuleRepository> DefaultScanner<R> {
    pub fn new(rule_repo: Arc<R>) -> Self {
        Self { rule_repo }
    }

    /// Parse one file and evaluate the full rule set against it.
    ///
    /// A parse failure is fatal to this file's result only; the caller
    /// decides whether to abort the run or continue with remaining files.
    #[instrument(name = "scan_file", skip(self, path), fields(file = %path.display()))]
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let config = parser::parse_file(path)?;
        let findings = self.scan(&config)?;
        Ok(ScanResult {
            file: path.display().to_string(),
            findings,
        })
    }
}

impl<R: RuleRepository> Scanner for DefaultScanner<R> {
    #[instrument(name = "scan_config", skip(self, config), fields(file = %config.path().display()))]
    fn scan(&self, config: &Config) -> Result<Vec<Finding>> {
        let rule_set = self.rule_repo.load_rules()?;
        let findings: Vec<Finding> = rule_set
            .rules
            .iter()
            .filter_map(|rule| evaluate::evaluate(rule, config))
            .collect();
        debug!(
            rules = rule_set.rules.len(),
            findings = findings.len(),
            "scan completed"
        );
        Ok(findings)
    }
}
