use std::collections::HashMap;

use serde_json::Value;

use crate::decode::object::{make_object, props_from_string};
use crate::decode::primitive::{parse_array, parse_primitive};
use crate::decode::ValueDecoder;
use crate::error::{DecodeError, ParseError};
use crate::param::{SerializationMethod, Style};
use crate::schema::SchemaRef;

/// Decodes values of path parameters from pre-extracted path segments.
///
/// Supports the `simple`, `label` and `matrix` styles.
pub struct PathParamDecoder<'r> {
    pub path_params: &'r HashMap<String, String>,
}

impl<'r> PathParamDecoder<'r> {
    fn raw(&self, name: &str) -> Option<&'r str> {
        match self.path_params.get(name) {
            Some(raw) if !raw.is_empty() => Some(raw),
            _ => None,
        }
    }
}

impl ValueDecoder for PathParamDecoder<'_> {
    fn decode_primitive(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        let prefix = match sm.style {
            Style::Simple => String::new(),
            Style::Label => ".".to_string(),
            Style::Matrix => format!(";{name}="),
            _ => return Err(DecodeError::invalid_serialization(sm)),
        };
        let Some(raw) = self.raw(name) else {
            return Ok((None, false));
        };
        let src = cut_prefix(raw, &prefix)?;
        let value = parse_primitive(src, schema)?;
        Ok((value, true))
    }

    fn decode_array(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        let (prefix, delim) = match (sm.style, sm.explode) {
            (Style::Simple, _) => (String::new(), ",".to_string()),
            (Style::Label, false) => (".".to_string(), ",".to_string()),
            (Style::Label, true) => (".".to_string(), ".".to_string()),
            (Style::Matrix, false) => (format!(";{name}="), ",".to_string()),
            (Style::Matrix, true) => (format!(";{name}="), format!(";{name}=")),
            _ => return Err(DecodeError::invalid_serialization(sm)),
        };
        let Some(raw) = self.raw(name) else {
            return Ok((None, false));
        };
        let src = cut_prefix(raw, &prefix)?;
        let parts: Vec<&str> = src.split(delim.as_str()).collect();
        let value = parse_array(&parts, schema)?;
        Ok((value, true))
    }

    fn decode_object(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        let (prefix, props_delim, value_delim) = match (sm.style, sm.explode) {
            (Style::Simple, false) => (String::new(), ",", ","),
            (Style::Simple, true) => (String::new(), ",", "="),
            (Style::Label, false) => (".".to_string(), ",", ","),
            (Style::Label, true) => (".".to_string(), ".", "="),
            (Style::Matrix, false) => (format!(";{name}="), ",", ","),
            (Style::Matrix, true) => (";".to_string(), ";", "="),
            _ => return Err(DecodeError::invalid_serialization(sm)),
        };
        let Some(raw) = self.raw(name) else {
            return Ok((None, false));
        };
        let src = cut_prefix(raw, &prefix)?;
        let props = props_from_string(src, props_delim, value_delim)?;
        let obj = make_object(&props, schema)?;
        Ok((Some(Value::Object(obj)), true))
    }

    fn probe(&self, name: &str) -> bool {
        self.path_params.contains_key(name)
    }
}

/// Validate that a raw path value carries the prefix its style requires and
/// strip it.
fn cut_prefix<'a>(raw: &'a str, prefix: &str) -> Result<&'a str, ParseError> {
    if prefix.is_empty() {
        return Ok(raw);
    }
    raw.strip_prefix(prefix).ok_or_else(|| {
        ParseError::invalid_format(raw, format!("a value must be prefixed with {prefix:?}"))
    })
}
