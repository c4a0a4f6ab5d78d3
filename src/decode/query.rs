use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::decode::object::{deep_get, make_object, props_from_string, NESTED_DELIMITER};
use crate::decode::primitive::parse_primitive;
use crate::decode::ValueDecoder;
use crate::error::{DecodeError, ParseError};
use crate::param::{SerializationMethod, Style};
use crate::schema::{SchemaRef, SchemaType};

/// Square-bracket subscripts of a deepObject query key, e.g. `a[b][c]`.
static DEEP_OBJECT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("deepObject key pattern"));

/// Decodes values of query parameters from the parsed query multi-map.
///
/// Supports the `form`, `spaceDelimited`, `pipeDelimited` and `deepObject`
/// styles. Array items and urlencoded body properties go through
/// [`QueryParamDecoder::parse_value`], which resolves schema composition
/// before falling back to the primitive parser.
pub struct QueryParamDecoder<'r> {
    pub values: &'r HashMap<String, Vec<String>>,
}

impl QueryParamDecoder<'_> {
    fn raw_values(&self, name: &str) -> (&[String], bool) {
        match self.values.get(name) {
            Some(values) => (values.as_slice(), true),
            None => (&[], false),
        }
    }

    fn parse_array(&self, raw: &[&str], schema: SchemaRef<'_>) -> Result<Option<Value>, DecodeError> {
        let items = schema.items_or_empty();
        let mut out = Vec::with_capacity(raw.len());
        for (index, item) in raw.iter().enumerate() {
            match self.parse_value(item, items) {
                Ok(Some(value)) => out.push(value),
                Ok(None) => return Ok(None),
                Err(DecodeError::Parse(err)) => {
                    return Err(ParseError::wrap_index(index, err).into())
                }
                Err(err) => return Err(DecodeError::Other(format!("item {index}: {err}"))),
            }
        }
        Ok(Some(Value::Array(out)))
    }

    /// Parse one raw scalar, resolving `allOf`/`anyOf`/`oneOf` before the
    /// primitive parser. Unlike the styled `oneOf` path, exactly one member
    /// must match here.
    pub(crate) fn parse_value(
        &self,
        raw: &str,
        schema: SchemaRef<'_>,
    ) -> Result<Option<Value>, DecodeError> {
        let all_of = schema.all_of();
        if !all_of.is_empty() {
            let mut value = None;
            for member in all_of {
                value = self.parse_value(raw, member)?;
                if value.is_none() {
                    break;
                }
            }
            return Ok(value);
        }

        let any_of = schema.any_of();
        if !any_of.is_empty() {
            let mut last_err = None;
            for member in any_of {
                match self.parse_value(raw, member) {
                    Ok(value) => return Ok(value),
                    Err(err) => last_err = Some(err),
                }
            }
            return match last_err {
                Some(err) => Err(err),
                None => Ok(None),
            };
        }

        let one_of = schema.one_of();
        if !one_of.is_empty() {
            let mut matched = 0usize;
            let mut value = None;
            for member in one_of {
                if let Ok(v) = self.parse_value(raw, member) {
                    value = v;
                    matched += 1;
                }
            }
            if matched == 1 {
                return Ok(value);
            }
            return Err(DecodeError::Other(format!(
                "decoding oneOf failed: {matched} schemas matched"
            )));
        }

        if schema.not_schema().is_some() {
            return Err(ParseError::unsupported_format("not implemented: decoding 'not'").into());
        }

        Ok(parse_primitive(raw, schema)?)
    }
}

impl ValueDecoder for QueryParamDecoder<'_> {
    fn decode_primitive(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Form {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let (values, found) = self.raw_values(name);
        if values.is_empty() {
            return Ok((None, found));
        }
        if schema.types().is_empty() && schema.pattern().is_some() {
            return Ok((Some(Value::from(values[0].as_str())), found));
        }
        let value = parse_primitive(&values[0], schema)?;
        Ok((value, found))
    }

    fn decode_array(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        match (sm.style, sm.explode) {
            (Style::Form, _) => {}
            (Style::SpaceDelimited | Style::PipeDelimited, false) => {}
            _ => return Err(DecodeError::invalid_serialization(sm)),
        }
        let (values, found) = self.raw_values(name);
        if values.is_empty() {
            return Ok((None, found));
        }
        let value = if sm.explode {
            let raw: Vec<&str> = values.iter().map(String::as_str).collect();
            self.parse_array(&raw, schema)?
        } else {
            let delim = match sm.style {
                Style::SpaceDelimited => " ",
                Style::PipeDelimited => "|",
                _ => ",",
            };
            let raw: Vec<&str> = values[0].split(delim).collect();
            self.parse_array(&raw, schema)?
        };
        Ok((value, found))
    }

    fn decode_object(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        let props: Option<BTreeMap<String, String>> = match (sm.style, sm.explode) {
            (Style::Form, true) => {
                if self.values.is_empty() {
                    None
                } else {
                    Some(
                        self.values
                            .iter()
                            .map(|(key, values)| {
                                (key.clone(), values.first().cloned().unwrap_or_default())
                            })
                            .collect(),
                    )
                }
            }
            (Style::Form, false) => match self.values.get(name) {
                Some(values) if !values.is_empty() => {
                    Some(props_from_string(&values[0], ",", ",")?)
                }
                _ => None,
            },
            (Style::DeepObject, true) => {
                let mut props = BTreeMap::new();
                for (key, values) in self.values {
                    let subscripts: Vec<&str> = DEEP_OBJECT_KEY
                        .captures_iter(key)
                        .filter_map(|captures| captures.get(1))
                        .map(|m| m.as_str())
                        .collect();
                    match subscripts.len() {
                        0 => continue,
                        1 => {
                            props.insert(
                                subscripts[0].to_string(),
                                values.join(NESTED_DELIMITER),
                            );
                        }
                        _ => {
                            props.insert(
                                subscripts.join(NESTED_DELIMITER),
                                values.join(NESTED_DELIMITER),
                            );
                        }
                    }
                }
                if props.is_empty() {
                    None
                } else {
                    Some(props)
                }
            }
            _ => return Err(DecodeError::invalid_serialization(sm)),
        };

        let Some(props) = props else {
            return Ok((None, false));
        };
        let obj = make_object(&props, schema)?;

        let mut found = false;
        'properties: for (prop_name, _) in schema.properties() {
            if props.contains_key(prop_name) {
                found = true;
                break;
            }
            let types = schema.types();
            if types.permits(SchemaType::Array) || types.permits(SchemaType::Object) {
                for key in props.keys() {
                    let path: Vec<&str> = key.split(NESTED_DELIMITER).collect();
                    if deep_get(&obj, &path).is_some() {
                        found = true;
                        break 'properties;
                    }
                }
            }
        }

        Ok((Some(Value::Object(obj)), found))
    }

    fn probe(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}
