//! In-process converter between structured data formats.
//!
//! Every conversion goes through a `serde_json::Value`: the source is
//! parsed into it and the target is rendered from it.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::path::Path;
use tokio::fs;

use super::xml::{read_xml, write_xml};
use crate::ports::{ConversionInput, Converter, ConverterError};

const JSON_INDENT: &[u8] = b"    ";

/// Structured formats handled in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
    Xml,
    /// The compact JSON string representation of the data.
    Text,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Yaml => "yaml",
            DataFormat::Xml => "xml",
            DataFormat::Text => "text",
        }
    }
}

/// Converts between JSON, YAML and XML documents, or flattens them to text.
#[derive(Debug, Clone)]
pub struct StructuredDataConverter {
    source: DataFormat,
    target: DataFormat,
    name: String,
}

impl StructuredDataConverter {
    pub fn new(source: DataFormat, target: DataFormat) -> Self {
        Self {
            source,
            target,
            name: format!("{}->{}", source.as_str(), target.as_str()),
        }
    }

    /// Parses `text` in this converter's source format.
    pub fn parse(&self, text: &str) -> Result<Value, ConverterError> {
        match self.source {
            DataFormat::Json | DataFormat::Text => {
                serde_json::from_str(text).map_err(|e| ConverterError::parse("json", e))
            }
            DataFormat::Yaml => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_str(text).map_err(|e| ConverterError::parse("yaml", e))?;
                yaml_to_json(yaml)
            }
            DataFormat::Xml => read_xml(text),
        }
    }

    /// Renders `value` in this converter's target format.
    pub fn render(&self, value: &Value) -> Result<String, ConverterError> {
        match self.target {
            DataFormat::Json => to_indented_json(value),
            DataFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| ConverterError::parse("yaml", e))
            }
            DataFormat::Xml => write_xml(value),
            DataFormat::Text => {
                serde_json::to_string(value).map_err(|e| ConverterError::parse("json", e))
            }
        }
    }
}

#[async_trait]
impl Converter for StructuredDataConverter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn convert(&self, input: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
        let ConversionInput::File(source) = input else {
            return Err(ConverterError::unsupported_input(&self.name, input));
        };

        let text = fs::read_to_string(source).await?;
        let value = self.parse(&text)?;
        let rendered = self.render(&value)?;
        fs::write(output, rendered).await?;
        Ok(())
    }
}

fn to_indented_json(value: &Value) -> Result<String, ConverterError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ConverterError::parse("json", e))?;
    String::from_utf8(buffer).map_err(|e| ConverterError::parse("json", e))
}

/// Converts a YAML value to JSON, stringifying scalar mapping keys.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, ConverterError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n)?,
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, ConverterError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Number(i.into()));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Value::Number(u.into()));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ConverterError::UnsupportedStructure {
            structure: format!("number {n}"),
        })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, ConverterError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        other => Err(ConverterError::UnsupportedStructure {
            structure: format!("mapping key {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn run(source: DataFormat, target: DataFormat, content: &str) -> Result<String, ConverterError> {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        std::fs::write(&input, content).unwrap();

        StructuredDataConverter::new(source, target)
            .convert(&ConversionInput::File(input), &output)
            .await?;
        Ok(std::fs::read_to_string(output).unwrap())
    }

    #[tokio::test]
    async fn test_json_to_yaml() {
        let out = run(DataFormat::Json, DataFormat::Yaml, r#"{"name": "demo", "n": 2}"#)
            .await
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed["name"], serde_yaml::Value::from("demo"));
        assert_eq!(parsed["n"], serde_yaml::Value::from(2));
    }

    #[tokio::test]
    async fn test_yaml_to_json_uses_four_space_indent() {
        let out = run(DataFormat::Yaml, DataFormat::Json, "a: 1\n").await.unwrap();
        assert_eq!(out, "{\n    \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_yaml_with_numeric_keys() {
        let out = run(DataFormat::Yaml, DataFormat::Json, "1: one\ntrue: yes\n")
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"1": "one", "true": "yes"}));
    }

    #[tokio::test]
    async fn test_json_to_text_is_compact() {
        let out = run(DataFormat::Json, DataFormat::Text, "{\n  \"a\": [1, 2]\n}")
            .await
            .unwrap();
        assert_eq!(out, r#"{"a":[1,2]}"#);
    }

    #[tokio::test]
    async fn test_json_to_xml() {
        let out = run(DataFormat::Json, DataFormat::Xml, r#"{"note": {"to": "Tove"}}"#)
            .await
            .unwrap();
        assert_eq!(out, "<note>\n  <to>Tove</to>\n</note>\n");
    }

    #[tokio::test]
    async fn test_xml_to_json() {
        let out = run(DataFormat::Xml, DataFormat::Json, "<a><b>1</b></a>")
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"a": {"b": "1"}}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let result = run(DataFormat::Json, DataFormat::Yaml, "{broken").await;
        assert!(matches!(result, Err(ConverterError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_url_input_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let converter = StructuredDataConverter::new(DataFormat::Json, DataFormat::Yaml);
        let input = ConversionInput::Url(url::Url::parse("https://example.com").unwrap());

        let result = converter.convert(&input, &temp_dir.path().join("o")).await;

        assert!(matches!(
            result,
            Err(ConverterError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn test_name_describes_direction() {
        let converter = StructuredDataConverter::new(DataFormat::Xml, DataFormat::Yaml);
        assert_eq!(converter.name(), "xml->yaml");
    }
}
