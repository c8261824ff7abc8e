use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Format-agnostic view of one parsed configuration file.
///
/// The tree is schema-less: the same key may appear at several nesting depths
/// (`temperature` at the top level and again inside a provider block), and
/// every occurrence is a candidate during rule evaluation. The tree is never
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct Config {
    data: Map<String, Value>,
    path: PathBuf,
}

impl Config {
    pub fn new(data: Map<String, Value>, path: impl Into<PathBuf>) -> Self {
        Self {
            data,
            path: path.into(),
        }
    }

    /// Path of the file this config was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// True if any mapping at any depth contains a key equal to `field`.
    ///
    /// The search is existential, not path-scoped: `has_field("api_key")`
    /// finds both a top-level `api_key` and one nested under `providers`.
    /// Mappings inside sequences are not descended into.
    pub fn has_field(&self, field: &str) -> bool {
        has_field_in(&self.data, field)
    }

    /// Every value stored under a key equal to `field`, across all depths.
    ///
    /// A field recurring at multiple nesting levels yields multiple
    /// candidates. Order depends only on tree shape and is not guaranteed
    /// stable across equivalent inputs.
    pub fn field_values(&self, field: &str) -> Vec<&Value> {
        let mut values = Vec::new();
        collect_field_values(&self.data, field, &mut values);
        values
    }

    /// Space-joined concatenation of every string leaf, including string
    /// elements of sequences. Scope-free pattern rules match against this.
    pub fn string_corpus(&self) -> String {
        let mut corpus = String::new();
        collect_strings(&self.data, &mut corpus);
        corpus
    }

    /// Strict dotted-path lookup: every intermediate segment must be a
    /// mapping that contains the next segment. Returns `None` otherwise.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        let mut current = &self.data;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let value = current.get(segment)?;
            if segments.peek().is_none() {
                return Some(value);
            }
            current = value.as_object()?;
        }
        None
    }
}

fn has_field_in(data: &Map<String, Value>, field: &str) -> bool {
    data.iter().any(|(key, value)| {
        key == field
            || value
                .as_object()
                .map_or(false, |nested| has_field_in(nested, field))
    })
}

fn collect_field_values<'a>(data: &'a Map<String, Value>, field: &str, values: &mut Vec<&'a Value>) {
    for (key, value) in data {
        if key == field {
            values.push(value);
        }
        if let Some(nested) = value.as_object() {
            collect_field_values(nested, field, values);
        }
    }
}

fn collect_strings(data: &Map<String, Value>, corpus: &mut String) {
    for value in data.values() {
        match value {
            Value::String(text) => {
                corpus.push_str(text);
                corpus.push(' ');
            }
            Value::Object(nested) => collect_strings(nested, corpus),
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = item.as_str() {
                        corpus.push_str(text);
                        corpus.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> Config {
        match value {
            Value::Object(map) => Config::new(map, "test.json"),
            other => panic!("test config must be a mapping, got {other}"),
        }
    }

    #[test]
    fn has_field_finds_keys_at_any_depth() {
        let config = config(json!({
            "temperature": 0.7,
            "nested": { "api_key": "sk-test" }
        }));

        assert!(config.has_field("temperature"));
        assert!(config.has_field("api_key"));
        assert!(!config.has_field("missing"));
    }

    #[test]
    fn field_values_collects_every_occurrence() {
        let config = config(json!({
            "temperature": 0.7,
            "settings": { "temperature": 0.9 }
        }));

        let values = config.field_values("temperature");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn field_values_empty_for_absent_key() {
        let config = config(json!({ "model": "gpt-4" }));
        assert!(config.field_values("temperature").is_empty());
    }

    #[test]
    fn string_corpus_includes_sequence_elements() {
        let config = config(json!({
            "model": "gpt-4",
            "count": 3,
            "stop": ["END", "DONE"],
            "nested": { "prompt": "hello" }
        }));

        let corpus = config.string_corpus();
        assert!(corpus.contains("gpt-4"));
        assert!(corpus.contains("END"));
        assert!(corpus.contains("DONE"));
        assert!(corpus.contains("hello"));
        assert!(!corpus.contains('3'));
    }

    #[test]
    fn value_at_requires_exact_path() {
        let config = config(json!({
            "rate_limit": { "rpm": 100 }
        }));

        assert_eq!(config.value_at("rate_limit.rpm"), Some(&json!(100)));
        assert!(config.value_at("rate_limit.tpm").is_none());
        assert!(config.value_at("rpm").is_none());
        assert!(config.value_at("rate_limit.rpm.deeper").is_none());
    }

    #[test]
    fn value_at_stops_at_non_mapping_segments() {
        let config = config(json!({ "model": "gpt-4" }));
        assert!(config.value_at("model.name").is_none());
    }
}
