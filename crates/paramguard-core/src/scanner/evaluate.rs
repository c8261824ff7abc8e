use regex::Regex;
use serde_json::Value;
use tracing::trace;

use super::{Check, Condition, Finding, Rule};
use crate::config::Config;

/// Evaluate one rule against one config, producing at most one finding.
///
/// Evaluation never fails: an unrecognized check kind, a structurally
/// incomplete check, an invalid regex, or a non-numeric value offered to a
/// numeric predicate all degrade to "no violation", so one broken entry in a
/// custom rule pack cannot take down the rest of the pack.
pub fn evaluate(rule: &Rule, config: &Config) -> Option<Finding> {
    let location = match &rule.check {
        Check::PatternMatch { patterns } => check_pattern_match(rule, patterns, config),
        Check::NumericRange {
            parameter,
            parameters,
            min,
            max,
        } => check_numeric_range(parameter.as_deref(), parameters, *min, *max, config),
        Check::MissingField { field } => check_missing_field(field, config),
        Check::MissingFields { fields } => check_missing_fields(fields, config),
        Check::FieldExists { field } => check_field_exists(field, config),
        Check::CombinedConditions {
            conditions,
            require,
        } => check_combined_conditions(conditions, require, config),
        Check::ConditionalMissing {
            has_any,
            missing_all,
        } => check_conditional_missing(has_any, missing_all, config),
        Check::FieldCheck { fields, values } => check_field_check(fields, values, config),
        Check::StopSequenceComplexity {
            field,
            max_sequences,
            max_length,
        } => check_stop_sequence_complexity(field, *max_sequences, *max_length, config),
        Check::Unknown => None,
    }?;

    trace!(rule_id = %rule.id, %location, "rule violated");
    Some(Finding {
        rule_id: rule.id.clone(),
        name: rule.name.clone(),
        severity: rule.severity.clone(),
        category: rule.category.clone(),
        description: rule.description.clone(),
        location: if location.is_empty() {
            None
        } else {
            Some(location)
        },
        recommendation: rule.recommendation.clone(),
        references: rule.references.clone(),
    })
}

fn check_pattern_match(rule: &Rule, patterns: &[String], config: &Config) -> Option<String> {
    let regexes: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect();
    if regexes.is_empty() {
        return None;
    }

    if !rule.fields.is_empty() {
        for field in &rule.fields {
            for value in config.field_values(field) {
                if let Some(text) = value.as_str() {
                    if regexes.iter().any(|regex| regex.is_match(text)) {
                        return Some(field.clone());
                    }
                }
            }
        }
        return None;
    }

    let corpus = config.string_corpus();
    if regexes.iter().any(|regex| regex.is_match(&corpus)) {
        return Some("config content".to_string());
    }
    None
}

fn check_numeric_range(
    parameter: Option<&str>,
    parameters: &[String],
    min: f64,
    max: f64,
    config: &Config,
) -> Option<String> {
    match parameter {
        Some(param) if !param.is_empty() => check_single_range(param, min, max, config),
        _ => parameters
            .iter()
            .find_map(|param| check_single_range(param, min, max, config)),
    }
}

fn check_single_range(param: &str, min: f64, max: f64, config: &Config) -> Option<String> {
    // A zero range means the bounds were never configured; the check is
    // inert. Side effect: "must equal exactly zero" is inexpressible here.
    if min == 0.0 && max == 0.0 {
        return None;
    }
    for value in config.field_values(param) {
        if let Some(num) = value.as_f64() {
            if num < min || num > max {
                return Some(param.to_string());
            }
        }
    }
    None
}

fn check_missing_field(field: &str, config: &Config) -> Option<String> {
    if field.is_empty() || config.has_field(field) {
        return None;
    }
    Some(field.to_string())
}

fn check_missing_fields(fields: &[String], config: &Config) -> Option<String> {
    if fields.is_empty() || fields.iter().any(|field| config.has_field(field)) {
        return None;
    }
    Some(fields.join(", "))
}

fn check_field_exists(field: &str, config: &Config) -> Option<String> {
    if !field.is_empty() && config.has_field(field) {
        return Some(field.to_string());
    }
    None
}

fn check_combined_conditions(
    conditions: &[Condition],
    require: &str,
    config: &Config,
) -> Option<String> {
    let satisfied: Vec<&str> = conditions
        .iter()
        .filter(|condition| condition_holds(condition, config))
        .map(|condition| condition.parameter.as_str())
        .collect();

    let met = satisfied.len();
    let violated = match require {
        "all" => met == conditions.len(),
        "at_least_two" => met >= 2,
        // Exactly two, not "all of them": diverges from `all` as soon as a
        // rule declares more than two conditions.
        "both" => met == 2,
        "any" => met > 0,
        _ => false,
    };
    if violated {
        Some(satisfied.join(", "))
    } else {
        None
    }
}

fn condition_holds(condition: &Condition, config: &Config) -> bool {
    config
        .field_values(&condition.parameter)
        .into_iter()
        .any(|value| match condition.operator.as_str() {
            "greater_than" => match (value.as_f64(), condition.value.as_f64()) {
                (Some(num), Some(threshold)) => num > threshold,
                _ => false,
            },
            "equals" => stringify(value) == stringify(&condition.value),
            "not_equals" => stringify(value) != stringify(&condition.value),
            _ => false,
        })
}

fn check_conditional_missing(
    has_any: &[String],
    missing_all: &[String],
    config: &Config,
) -> Option<String> {
    if !has_any.iter().any(|field| config.has_field(field)) {
        return None;
    }
    if missing_all.iter().any(|field| config.has_field(field)) {
        return None;
    }
    Some(missing_all.join(", "))
}

fn check_field_check(fields: &[String], values: &[Value], config: &Config) -> Option<String> {
    for field in fields {
        for candidate in config.field_values(field) {
            let rendered = stringify(candidate);
            if values.iter().any(|forbidden| stringify(forbidden) == rendered) {
                return Some(field.clone());
            }
        }
    }
    None
}

fn check_stop_sequence_complexity(
    field: &str,
    max_sequences: usize,
    max_length: usize,
    config: &Config,
) -> Option<String> {
    for value in config.field_values(field) {
        match value {
            Value::Array(items) => {
                if max_sequences > 0 && items.len() > max_sequences {
                    return Some(field.to_string());
                }
                if max_length > 0 {
                    for item in items {
                        if let Some(text) = item.as_str() {
                            if text.len() > max_length {
                                return Some(field.to_string());
                            }
                        }
                    }
                }
            }
            Value::String(text) => {
                if max_length > 0 && text.len() > max_length {
                    return Some(field.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Render a value the way rule documents write literals, so `equals`
/// comparisons hold across config formats: `1` and `1.0` both render as
/// `"1"`, booleans as `true`/`false`, strings verbatim.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => {
            if let Some(int) = num.as_i64() {
                int.to_string()
            } else if let Some(int) = num.as_u64() {
                int.to_string()
            } else {
                match num.as_f64() {
                    Some(float) if float.fract() == 0.0 && float.abs() < 9.0e15 => {
                        format!("{}", float as i64)
                    }
                    _ => num.to_string(),
                }
            }
        }
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
