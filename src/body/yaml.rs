use std::io::Read;

use http::header::HeaderMap;
use serde_json::{Map, Value};

use crate::body::EncodingFn;
use crate::error::{DecodeError, ParseError, ParseErrorKind};
use crate::schema::SchemaRef;

/// Decode a YAML body into the same value domain as JSON.
pub fn yaml_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    let parsed: serde_yaml::Value = serde_yaml::from_reader(body).map_err(|err| {
        ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err)
    })?;
    yaml_to_json(parsed)
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, DecodeError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::from(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::from(s),
        serde_yaml::Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(yaml_to_json(item)?);
            }
            Value::Array(out)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut obj = Map::new();
            for (key, value) in mapping {
                let serde_yaml::Value::String(key) = key else {
                    return Err(ParseError::new(ParseErrorKind::InvalidFormat)
                        .with_reason("a mapping key must be a string")
                        .into());
                };
                obj.insert(key, yaml_to_json(value)?);
            }
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
