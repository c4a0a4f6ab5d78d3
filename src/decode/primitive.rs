use serde_json::Value;

use crate::error::ParseError;
use crate::schema::SchemaRef;

/// Parse a raw string into the primitive value its schema calls for.
///
/// Each type listed in the schema's type set is attempted in order and the
/// first successful parse wins. An empty string parses to no value, which
/// lets callers prune empty array elements. When no type matches, the last
/// attempt's error is returned; an untyped schema yields no value.
pub fn parse_primitive(raw: &str, schema: SchemaRef<'_>) -> Result<Option<Value>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut last_err = None;
    for type_name in schema.types().names() {
        match parse_primitive_as(raw, schema, type_name) {
            Ok(value) => return Ok(Some(value)),
            Err(err) => last_err = Some(err),
        }
    }
    match last_err {
        Some(err) => Err(err),
        None => Ok(None),
    }
}

fn parse_primitive_as(raw: &str, schema: SchemaRef<'_>, type_name: &str) -> Result<Value, ParseError> {
    match type_name {
        "integer" => {
            if schema.format() == Some("int32") {
                let value = parse_int_radix_i32(raw).map_err(|err| {
                    ParseError::invalid_format(raw, "an invalid integer").with_cause(err)
                })?;
                Ok(Value::from(value))
            } else {
                let value = parse_int_radix_i64(raw).map_err(|err| {
                    ParseError::invalid_format(raw, "an invalid integer").with_cause(err)
                })?;
                Ok(Value::from(value))
            }
        }
        "number" => {
            let value: f64 = raw.parse().map_err(|err| {
                ParseError::invalid_format(raw, "an invalid number").with_cause(err)
            })?;
            match serde_json::Number::from_f64(value) {
                Some(number) => Ok(Value::Number(number)),
                None => Err(ParseError::invalid_format(raw, "an invalid number")
                    .with_cause("value out of range".to_string())),
            }
        }
        "boolean" => match parse_bool_lenient(raw) {
            Some(value) => Ok(Value::from(value)),
            None => Err(ParseError::invalid_format(raw, "an invalid boolean")),
        },
        "string" => Ok(Value::from(raw)),
        other => {
            Err(ParseError::other(format!("schema has non primitive type {other}")).with_value(raw))
        }
    }
}

/// Parse the items of a raw array against the schema's `items`.
///
/// Arrays are all-or-nothing: an element that parses to no value nullifies
/// the whole array. Item errors carry the item index in their path.
pub fn parse_array(raw: &[&str], schema: SchemaRef<'_>) -> Result<Option<Value>, ParseError> {
    let items = schema.items_or_empty();
    let mut out = Vec::with_capacity(raw.len());
    for (index, item) in raw.iter().enumerate() {
        match parse_primitive(item, items) {
            Ok(Some(value)) => out.push(value),
            Ok(None) => return Ok(None),
            Err(err) => return Err(ParseError::wrap_index(index, err)),
        }
    }
    Ok(Some(Value::Array(out)))
}

fn split_radix(raw: &str) -> (String, u32) {
    let (sign, body) = match raw.as_bytes().first() {
        Some(b'+') => ("", &raw[1..]),
        Some(b'-') => ("-", &raw[1..]),
        _ => ("", raw),
    };
    let lowered = body.get(..2).map(str::to_ascii_lowercase);
    let (digits, radix) = match lowered.as_deref() {
        Some("0x") => (&body[2..], 16),
        Some("0o") => (&body[2..], 8),
        Some("0b") => (&body[2..], 2),
        _ => (body, 10),
    };
    (format!("{sign}{digits}"), radix)
}

fn parse_int_radix_i64(raw: &str) -> Result<i64, std::num::ParseIntError> {
    let (digits, radix) = split_radix(raw);
    i64::from_str_radix(&digits, radix)
}

fn parse_int_radix_i32(raw: &str) -> Result<i32, std::num::ParseIntError> {
    let (digits, radix) = split_radix(raw);
    i32::from_str_radix(&digits, radix)
}

pub(crate) fn parse_bool_lenient(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("t") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("f") || raw == "0" {
        Some(false)
    } else {
        None
    }
}
