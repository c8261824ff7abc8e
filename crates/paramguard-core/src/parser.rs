use std::{fs, io, path::Path};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::config::Config;

/// Errors produced while turning raw bytes into a [`Config`].
///
/// A parse failure is fatal for the affected file only; it carries no
/// meaning for other files in the same run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} as JSON")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {path} as YAML")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to parse {path} as TOML")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("unable to detect the format of {path}")]
    UnsupportedFormat { path: String },
}

/// Parse one configuration file into a [`Config`], dispatching on the file
/// extension and falling back to auto-detection (JSON, then YAML, then TOML)
/// for anything unrecognized.
pub fn parse_file(path: &Path) -> Result<Config, ParseError> {
    let raw = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");

    let data = if extension == "env" || file_name == ".env" {
        parse_env(&raw)
    } else {
        match extension.as_str() {
            "json" => parse_json(&raw).map_err(|source| ParseError::Json {
                path: path.display().to_string(),
                source,
            })?,
            "yaml" | "yml" => parse_yaml(&raw).map_err(|source| ParseError::Yaml {
                path: path.display().to_string(),
                source,
            })?,
            "toml" => parse_toml(&raw).map_err(|source| ParseError::Toml {
                path: path.display().to_string(),
                source,
            })?,
            _ => {
                trace!(file = %path.display(), "unrecognized extension, auto-detecting");
                auto_detect(&raw).ok_or_else(|| ParseError::UnsupportedFormat {
                    path: path.display().to_string(),
                })?
            }
        }
    };

    Ok(Config::new(data, path))
}

fn parse_json(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn parse_yaml(raw: &str) -> Result<Map<String, Value>, serde_yaml::Error> {
    serde_yaml::from_str(raw)
}

fn parse_toml(raw: &str) -> Result<Map<String, Value>, toml::de::Error> {
    let table: toml::Table = toml::from_str(raw)?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(int) => Value::from(int),
        toml::Value::Float(float) => serde_json::Number::from_f64(float)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// Line-oriented `KEY=VALUE` input. Blank lines and `#` comments are
/// skipped, lines without `=` are ignored, surrounding quotes are stripped,
/// and every value is kept as a string.
fn parse_env(raw: &str) -> Map<String, Value> {
    let mut data = Map::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches(|ch| ch == '"' || ch == '\'');
            data.insert(key.trim().to_string(), Value::String(value.to_string()));
        }
    }
    data
}

fn auto_detect(raw: &str) -> Option<Map<String, Value>> {
    parse_json(raw)
        .ok()
        .or_else(|| parse_yaml(raw).ok())
        .or_else(|| parse_toml(raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_named(name: &str, content: &str) -> Result<Config, ParseError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        parse_file(&path)
    }

    #[test]
    fn parses_each_supported_format() {
        let cases = [
            (
                "config.json",
                r#"{"model": "gpt-4", "temperature": 0.7, "max_tokens": 1000}"#,
            ),
            (
                "config.yaml",
                "model: gpt-4\ntemperature: 0.7\nmax_tokens: 1000\n",
            ),
            (
                "config.toml",
                "model = \"gpt-4\"\ntemperature = 0.7\nmax_tokens = 1000\n",
            ),
        ];

        for (name, content) in cases {
            let config = parse_named(name, content).unwrap();
            for key in ["model", "temperature", "max_tokens"] {
                assert!(config.has_field(key), "{name} should contain {key}");
            }
        }
    }

    #[test]
    fn parses_env_files_as_strings() {
        let config = parse_named(
            ".env",
            "# provider settings\nMODEL=gpt-4\nTEMPERATURE=0.7\n\nAPI_KEY=\"sk-quoted\"\nbroken line\n",
        )
        .unwrap();

        assert_eq!(config.data().get("MODEL"), Some(&Value::String("gpt-4".into())));
        assert_eq!(
            config.data().get("TEMPERATURE"),
            Some(&Value::String("0.7".into()))
        );
        assert_eq!(
            config.data().get("API_KEY"),
            Some(&Value::String("sk-quoted".into()))
        );
        assert!(!config.has_field("broken line"));
    }

    #[test]
    fn env_extension_on_named_files() {
        let config = parse_named("production.env", "RATE_LIMIT=100\n").unwrap();
        assert!(config.has_field("RATE_LIMIT"));
    }

    #[test]
    fn nested_structures_survive_parsing() {
        let config = parse_named(
            "config.toml",
            "model = \"gpt-4\"\n\n[rate_limit]\nrpm = 100\ntpm = 10000\n",
        )
        .unwrap();

        assert!(config.has_field("rpm"));
        assert_eq!(config.value_at("rate_limit.rpm"), Some(&serde_json::json!(100)));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = parse_named("config.json", r#"{"model": "gpt-4""#).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn empty_json_is_a_parse_error() {
        let err = parse_named("config.json", "").unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(&dir.path().join("nonexistent.json")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn unknown_extension_auto_detects_json() {
        let config = parse_named("config.conf", r#"{"temperature": 1.5}"#).unwrap();
        assert!(config.has_field("temperature"));
    }

    #[test]
    fn unknown_extension_auto_detects_yaml() {
        let config = parse_named("config.conf", "temperature: 1.5\nmodel: gpt-4\n").unwrap();
        assert!(config.has_field("model"));
    }

    #[test]
    fn undetectable_content_is_unsupported() {
        let err = parse_named("config.bin", "\u{1}\u{2}not structured at all").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat { .. }));
    }

    #[test]
    fn scalar_documents_are_rejected() {
        // A bare scalar is valid YAML but not a mapping.
        let err = parse_named("config.yaml", "just a string\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml { .. }));
    }
}
