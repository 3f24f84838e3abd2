//! Canonical JSON output.
//!
//! Documents are rendered with `serde_json`'s pretty printer, then a text
//! pass folds number-only array elements and closing brackets onto the
//! previous line, so vectors like `[1, 2, 3]` render as `[1,2,3]` instead of
//! one element per line.

use std::str::FromStr;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, ser::PrettyFormatter, Map, Number, Value as JsonValue};

use crate::{
    error::SerializationError,
    scene::{Document, Object, Value},
};

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Apply the compaction pass.
    pub compact: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { indent: 1, compact: true }
    }
}

/// Builds the JSON tree for a document.
///
/// Only root children are emitted, root level properties are dropped.
pub fn document_to_json(document: &Document) -> Result<JsonValue> {
    let children = document
        .children
        .iter()
        .map(object_to_json)
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({ "children": children }))
}

/// Empty `inherits`, `attributes` and `children` are omitted.
pub fn object_to_json(object: &Object) -> Result<JsonValue> {
    let mut map = Map::new();

    map.insert("def".into(), object.specifier.to_string().into());
    map.insert("type".into(), object.type_name.clone().into());
    map.insert("name".into(), object.name.clone().into());

    if !object.inherits.is_empty() {
        map.insert("inherits".into(), object.inherits.clone().into());
    }

    if !object.attributes.is_empty() {
        let attributes = object
            .attributes
            .iter()
            .map(|(key, value)| -> Result<(String, JsonValue)> {
                let value = value_to_json(value).with_context(|| format!("Invalid value for {}.{}", object.name, key))?;
                Ok((key.clone(), value))
            })
            .collect::<Result<Map<_, _>>>()?;

        map.insert("attributes".into(), attributes.into());
    }

    if !object.children.is_empty() {
        let children = object
            .children
            .iter()
            .map(object_to_json)
            .collect::<Result<Vec<_>>>()?;

        map.insert("children".into(), children.into());
    }

    Ok(map.into())
}

/// References become `{"ref": "<path>"}`.
pub fn value_to_json(value: &Value) -> Result<JsonValue> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Bool(flag) => (*flag).into(),
        Value::Int(int) => (*int).into(),
        Value::BigInt(digits) => Number::from_str(digits)
            .map(JsonValue::Number)
            .map_err(|err| SerializationError(format!("Invalid integer {}: {}", digits, err)))?,
        Value::Float(float) => Number::from_f64(*float)
            .map(JsonValue::Number)
            .ok_or_else(|| SerializationError(format!("{} has no JSON representation", float)))?,
        Value::String(str) => str.as_str().into(),
        Value::Reference(path) => json!({ "ref": path }),
        Value::Array(items) => items.iter().map(value_to_json).collect::<Result<Vec<_>>>()?.into(),
    };

    Ok(json)
}

/// Joins lone numbers and closing brackets onto the preceding line.
///
/// A line qualifies when it is indented, holds nothing but a number (or `]`)
/// with an optional trailing comma, and is followed by another line.
pub struct Compactor {
    pattern: Regex,
}

impl Compactor {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^\s+([-+0-9.e]+|\])(,?)$").context("Unable to compile compaction pattern")?;
        Ok(Self { pattern })
    }

    pub fn compact(&self, text: &str) -> String {
        let lines = text.split('\n').collect::<Vec<_>>();
        let mut out = String::with_capacity(text.len());

        for (index, line) in lines.iter().enumerate() {
            let joinable = index > 0 && index + 1 < lines.len();

            match self.pattern.captures(line).filter(|_| joinable) {
                Some(captures) => {
                    out.push_str(&captures[1]);
                    out.push_str(&captures[2]);
                }
                None => {
                    if index > 0 {
                        out.push('\n');
                    }
                    out.push_str(line);
                }
            }
        }

        out
    }
}

/// Renders documents to canonical JSON text.
pub struct Serializer {
    options: Options,
    compactor: Compactor,
}

impl Serializer {
    pub fn new(options: Options) -> Result<Self> {
        Ok(Self {
            options,
            compactor: Compactor::new()?,
        })
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn serialize(&self, document: &Document) -> Result<String> {
        let json = document_to_json(document)?;
        let text = self.pretty(&json)?;

        if self.options.compact {
            Ok(self.compactor.compact(&text))
        } else {
            Ok(text)
        }
    }

    fn pretty(&self, json: &JsonValue) -> Result<String> {
        let indent = " ".repeat(self.options.indent);
        let mut buffer = Vec::new();

        let mut ser = serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
        json.serialize(&mut ser)
            .map_err(|err| SerializationError(err.to_string()))?;

        let text = String::from_utf8(buffer).map_err(|err| SerializationError(err.to_string()))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Attributes, Specifier};

    fn sample() -> Document {
        let mut ball = Object::new(Specifier::Def, Some("Sphere".into()), "Ball");
        ball.attributes.insert("radius".into(), Value::Float(2.5));

        let mut world = Object::new(Specifier::Def, None, "World");
        world.attributes.insert(
            "offset".into(),
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
        world.children.push(ball);

        Document {
            attributes: Attributes::new(),
            children: vec![world],
        }
    }

    #[test]
    fn empty_fields_are_omitted() -> Result<()> {
        let object = Object::new(Specifier::Over, None, "n");
        let json = object_to_json(&object)?;

        assert_eq!(json, json!({ "def": "over", "type": null, "name": "n" }));
        Ok(())
    }

    #[test]
    fn field_order() -> Result<()> {
        let mut object = Object::new(Specifier::Class, Some("Xform".into()), "B");
        object.inherits.push("</A>".into());
        object.attributes.insert("x".into(), Value::Null);
        object.children.push(Object::new(Specifier::Def, None, "C"));

        let json = object_to_json(&object)?;
        let keys = json.as_object().unwrap().keys().collect::<Vec<_>>();

        assert_eq!(keys, ["def", "type", "name", "inherits", "attributes", "children"]);
        assert_eq!(json["inherits"], json!(["</A>"]));
        Ok(())
    }

    #[test]
    fn values() -> Result<()> {
        assert_eq!(value_to_json(&Value::Null)?, json!(null));
        assert_eq!(value_to_json(&Value::Bool(true))?, json!(true));
        assert_eq!(value_to_json(&Value::Int(-3))?, json!(-3));
        assert_eq!(
            value_to_json(&Value::BigInt("-123456789012345678901234".into()))?.to_string(),
            "-123456789012345678901234"
        );
        assert_eq!(value_to_json(&Value::Float(0.5))?, json!(0.5));
        assert_eq!(value_to_json(&Value::String("st".into()))?, json!("st"));
        assert_eq!(value_to_json(&Value::Reference("</A/B>".into()))?, json!({ "ref": "</A/B>" }));
        assert_eq!(
            value_to_json(&Value::Array(vec![Value::Int(1), Value::Float(2.0)]))?,
            json!([1, 2.0])
        );
        Ok(())
    }

    #[test]
    fn non_finite_float() {
        let err = value_to_json(&Value::Float(f64::INFINITY)).unwrap_err();
        assert!(err.downcast_ref::<SerializationError>().is_some());
    }

    #[test]
    fn document_root_has_only_children() -> Result<()> {
        let mut document = Document::default();
        document.attributes.insert("upAxis".into(), Value::String("Y".into()));

        assert_eq!(document_to_json(&document)?, json!({ "children": [] }));
        Ok(())
    }

    #[test]
    fn serialize_compact() -> Result<()> {
        let serializer = Serializer::new(Options::default())?;
        let text = serializer.serialize(&sample())?;

        let expected = r#"{
 "children": [
  {
   "def": "def",
   "type": null,
   "name": "World",
   "attributes": {
    "offset": [1,2,3]
   },
   "children": [
    {
     "def": "def",
     "type": "Sphere",
     "name": "Ball",
     "attributes": {
      "radius": 2.5
     }
    }]
  }]
}"#;

        assert_eq!(text, expected);

        // Output is still valid JSON with the same content.
        let parsed: JsonValue = serde_json::from_str(&text)?;
        assert_eq!(parsed, document_to_json(&sample())?);
        Ok(())
    }

    #[test]
    fn serialize_without_compaction() -> Result<()> {
        let serializer = Serializer::new(Options { indent: 2, compact: false })?;
        let text = serializer.serialize(&sample())?;

        assert!(text.contains("\"offset\": [\n          1,\n          2,\n          3\n        ]"));
        Ok(())
    }

    #[test]
    fn compaction_rules() -> Result<()> {
        let compactor = Compactor::new()?;

        // Numbers with signs, fractions and exponents are joined.
        assert_eq!(
            compactor.compact("[\n -1.5,\n +2,\n 1e-7\n ]\n"),
            "[-1.5,+2,1e-7]\n"
        );

        // Strings and literals stay on their own lines.
        let text = "[\n \"a\",\n true,\n null\n]";
        assert_eq!(compactor.compact(text), text);

        // The last line is never joined, nor are unindented lines.
        assert_eq!(compactor.compact("[\n1,\n ]"), "[\n1,\n ]");
        Ok(())
    }

    #[test]
    fn compaction_is_idempotent() -> Result<()> {
        let serializer = Serializer::new(Options {
            indent: 1,
            compact: false,
        })?;
        let compactor = Compactor::new()?;

        let once = compactor.compact(&serializer.serialize(&sample())?);
        let twice = compactor.compact(&once);

        assert_eq!(once, twice);
        Ok(())
    }
}
