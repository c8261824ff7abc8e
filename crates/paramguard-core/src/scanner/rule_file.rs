use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

use super::{RuleRepository, RuleSet};

/// Loads a YAML rule pack from a single file, caching the decoded set for
/// the lifetime of the repository.
///
/// Loading performs structural validation only: the document must decode
/// into the [`RuleSet`] shape, but nothing checks that severities use the
/// conventional literals, that ids are unique, or that a check names a
/// parameter. Semantically hollow rules simply never produce findings.
pub struct FileRuleRepository {
    path: PathBuf,
    cache: OnceCell<RuleSet>,
}

impl FileRuleRepository {
    /// Create a repository backed by the given rule document.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<RuleSet> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read rules file at {}", self.path.display()))?;
        let rule_set: RuleSet = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid rule document at {}", self.path.display()))?;
        Ok(rule_set)
    }
}

impl RuleRepository for FileRuleRepository {
    fn load_rules(&self) -> Result<RuleSet> {
        let rule_set = self.cache.get_or_try_init(|| self.load())?;
        Ok(rule_set.clone())
    }
}
