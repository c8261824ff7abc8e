use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

pub mod default_scanner;
pub mod evaluate;
pub mod rule_file;

/// Top-level shape of a rule document (`rules.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// One declarative detection rule: reporting metadata plus one [`Check`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier within a pack by convention (e.g. `SECRETS_001`);
    /// uniqueness is not enforced at load time.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// CRITICAL | HIGH | MEDIUM | LOW by convention. Carried verbatim into
    /// findings without validation.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub check: Check,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub references: Vec<String>,
    /// Restricts a `pattern_match` rule to the listed field names. Empty
    /// means the whole string corpus of the config is in scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Detection logic embedded in a rule, discriminated by `type`.
///
/// A `type` tag this build does not recognize deserializes into
/// [`Check::Unknown`], which never produces a finding — a rule pack written
/// for a newer scanner still loads and its remaining rules still run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// Match regular expressions against field values (scoped by
    /// `Rule::fields`) or against the whole string corpus.
    PatternMatch {
        #[serde(default)]
        patterns: Vec<String>,
    },
    /// Flag numeric values outside `[min, max]`. A zero range (both bounds
    /// zero) means the bounds were never configured and the check is inert.
    NumericRange {
        #[serde(default)]
        parameter: Option<String>,
        #[serde(default)]
        parameters: Vec<String>,
        #[serde(default)]
        min: f64,
        #[serde(default)]
        max: f64,
    },
    /// Flag a config that lacks the named field everywhere.
    MissingField {
        #[serde(default)]
        field: String,
    },
    /// Flag a config in which every listed field is absent.
    MissingFields {
        #[serde(default)]
        fields: Vec<String>,
    },
    /// Flag a config that contains the named field anywhere.
    FieldExists {
        #[serde(default)]
        field: String,
    },
    /// Aggregate several parameter conditions under a `require` policy.
    CombinedConditions {
        #[serde(default)]
        conditions: Vec<Condition>,
        /// `all`, `at_least_two`, `both` or `any`. Anything else never
        /// triggers. `both` is satisfied by exactly two conditions and is
        /// deliberately kept distinct from `all`.
        #[serde(default)]
        require: String,
    },
    /// "If any of `has_any` is configured, at least one of `missing_all`
    /// must be too."
    ConditionalMissing {
        #[serde(default)]
        has_any: Vec<String>,
        #[serde(default)]
        missing_all: Vec<String>,
    },
    /// Flag fields whose stringified value equals one of the forbidden
    /// `values`.
    FieldCheck {
        #[serde(default)]
        fields: Vec<String>,
        #[serde(default)]
        values: Vec<Value>,
    },
    /// Bound the size and element length of a stop-sequence field. A zero
    /// limit is treated as unset.
    StopSequenceComplexity {
        #[serde(default)]
        field: String,
        #[serde(default)]
        max_sequences: usize,
        #[serde(default)]
        max_length: usize,
    },
    #[serde(other)]
    Unknown,
}

impl Default for Check {
    fn default() -> Self {
        Check::Unknown
    }
}

/// One clause of a `combined_conditions` check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub parameter: String,
    /// `greater_than`, `equals` or `not_equals`. Anything else leaves the
    /// condition unsatisfied.
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

/// One reported concern: a single rule violated by a single config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub name: String,
    pub severity: String,
    pub category: String,
    pub description: String,
    /// Human-readable pointer to where the violation was observed, usually a
    /// field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub recommendation: String,
    pub references: Vec<String>,
}

/// All findings produced for one scanned file, in rule-pack order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub file: String,
    pub findings: Vec<Finding>,
}

/// Abstraction over rule loading so different backends (files, in-memory)
/// can be swapped transparently.
pub trait RuleRepository: Send + Sync {
    /// Retrieve the full rule set currently active.
    fn load_rules(&self) -> AnyResult<RuleSet>;

    /// Fetch a single rule by identifier if it exists.
    fn get_rule(&self, rule_id: &str) -> AnyResult<Option<Rule>> {
        Ok(self
            .load_rules()?
            .rules
            .into_iter()
            .find(|rule| rule.id == rule_id))
    }
}

/// Primary scanning interface that turns one parsed config into findings.
pub trait Scanner: Send + Sync {
    /// Evaluate the active rule set against the config, in rule order.
    fn scan(&self, config: &Config) -> AnyResult<Vec<Finding>>;
}
