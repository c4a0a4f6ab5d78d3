use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::decode::primitive::{parse_bool_lenient, parse_primitive};
use crate::error::{ParseError, PathSegment};
use crate::schema::{SchemaRef, SchemaType, TypeSet};

/// Delimiter used to join nested object keys and repeated values into flat
/// property strings. ASCII unit separator cannot occur in URL-safe input.
pub const NESTED_DELIMITER: &str = "\u{1f}";

/// Split a delimited string into a property map.
///
/// With distinct delimiters (`;k=v;k=v`) every token must itself split into
/// exactly two pieces on the value delimiter. With equal delimiters
/// (`k,v,k,v`) the token count must be even and consecutive pairs become key
/// and value.
pub fn props_from_string(
    src: &str,
    prop_delim: &str,
    value_delim: &str,
) -> Result<BTreeMap<String, String>, ParseError> {
    let mut props = BTreeMap::new();
    let pairs: Vec<&str> = src.split(prop_delim).collect();

    if prop_delim == value_delim {
        if pairs.len() % 2 != 0 {
            return Err(ParseError::invalid_format(
                src,
                format!(
                    "a value must be a list of object's properties in format \"name{value_delim}value\" separated by {prop_delim}"
                ),
            ));
        }
        for pair in pairs.chunks(2) {
            props.insert(pair[0].to_string(), pair[1].to_string());
        }
        return Ok(props);
    }

    for pair in pairs {
        let fields: Vec<&str> = pair.split(value_delim).collect();
        if fields.len() != 2 {
            return Err(ParseError::invalid_format(
                src,
                format!(
                    "a value must be a list of object's properties in format \"name{value_delim}value\" separated by {prop_delim}"
                ),
            ));
        }
        props.insert(fields[0].to_string(), fields[1].to_string());
    }
    Ok(props)
}

/// Fetch a value from a nested object tree, walking the given keys.
///
/// A scalar reached before the keys are exhausted is returned as-is.
pub(crate) fn deep_get<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    let mut current = obj;
    let mut result = None;
    for key in keys {
        let value = current.get(*key)?;
        result = Some(value);
        match value.as_object() {
            Some(next) => current = next,
            None => return Some(value),
        }
    }
    result
}

/// Assign a value into a nested object tree, creating intermediate objects
/// as needed.
pub(crate) fn deep_set(obj: &mut Map<String, Value>, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = obj;
    for key in parents {
        let slot = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
    }
    current.insert((*last).to_string(), value);
}

/// Resolve the schema of a nested key path by walking `properties`, falling
/// back to the `additionalProperties` schema whenever a segment is not a
/// declared property.
pub(crate) fn find_nested_schema<'s>(
    root: SchemaRef<'s>,
    keys: &[&str],
) -> Result<SchemaRef<'s>, String> {
    let mut current = root;
    for key in keys {
        match current.property(key) {
            Some(schema) => current = schema,
            None => match current.additional_properties().schema() {
                Some(schema) => current = schema,
                None => return Err(format!("nested schema for key {key:?} not found")),
            },
        }
    }
    Ok(current)
}

/// Fold a flat property map into an object tree directed by the schema.
///
/// Array-typed properties are split on the nested delimiter and converted to
/// their items' element kind; object-typed properties walk every flat key
/// whose first segment matches and deep-set the parsed leaf; anything else
/// parses one primitive. Keys with no declared property and no
/// `additionalProperties` fallback are left for the downstream validator.
pub fn make_object(
    props: &BTreeMap<String, String>,
    schema: SchemaRef<'_>,
) -> Result<Map<String, Value>, ParseError> {
    let mut obj = Map::new();

    for (prop_name, prop_schema) in schema.properties() {
        let types = prop_schema.types();
        if types.is(SchemaType::Array) {
            let raw = props.get(prop_name).map(String::as_str).unwrap_or("");
            let converted = convert_array_property(raw, prop_schema, &[prop_name])?;
            obj.insert(prop_name.to_string(), converted);
        } else if types.is(SchemaType::Object) {
            let nested_prefix = format!("{prop_name}{NESTED_DELIMITER}");
            for (key, raw) in props {
                if !key.starts_with(&nested_prefix) {
                    continue;
                }
                let map_keys: Vec<&str> = key.split(NESTED_DELIMITER).collect();
                let nested = match find_nested_schema(schema, &map_keys) {
                    Ok(nested) => nested,
                    Err(reason) => {
                        return Err(ParseError::other(reason).at_path(
                            map_keys
                                .iter()
                                .map(|k| PathSegment::Prop((*k).to_string()))
                                .collect(),
                        ))
                    }
                };
                if nested.types().permits(SchemaType::Array) {
                    let converted = convert_array_property(raw, nested, &map_keys)?;
                    deep_set(&mut obj, &map_keys, converted);
                    continue;
                }
                let value = parse_primitive(raw, nested)
                    .map_err(|err| ParseError::wrap_props(&map_keys, err))?;
                deep_set(&mut obj, &map_keys, value.unwrap_or(Value::Null));
            }
        } else {
            let raw = props.get(prop_name).map(String::as_str).unwrap_or("");
            let value = parse_primitive(raw, prop_schema)
                .map_err(|err| ParseError::wrap_props(&[prop_name], err))?;
            obj.insert(prop_name.to_string(), value.unwrap_or(Value::Null));
        }
    }

    Ok(obj)
}

fn convert_array_property(
    raw: &str,
    schema: SchemaRef<'_>,
    path: &[&str],
) -> Result<Value, ParseError> {
    let values: Vec<&str> = raw.split(NESTED_DELIMITER).collect();
    let items = schema.items_or_empty();
    for value in &values {
        parse_primitive(value, items).map_err(|err| ParseError::wrap_props(path, err))?;
    }
    convert_array_to_type(&values, &items.types()).map_err(|err| ParseError::wrap_props(path, err))
}

/// Convert a list of raw strings to the typed element kind the items schema
/// permits. Empty elements are dropped for the non-string kinds; string
/// arrays keep the raw list verbatim.
fn convert_array_to_type(values: &[&str], types: &TypeSet<'_>) -> Result<Value, ParseError> {
    if types.permits(SchemaType::Boolean) {
        let mut out = Vec::new();
        for raw in values.iter().filter(|v| !v.is_empty()) {
            match parse_bool_lenient(raw) {
                Some(value) => out.push(Value::from(value)),
                None => return Err(ParseError::invalid_format(*raw, "an invalid boolean")),
            }
        }
        Ok(collect_or_null(out))
    } else if types.permits(SchemaType::Integer) {
        let mut out = Vec::new();
        for raw in values.iter().filter(|v| !v.is_empty()) {
            let value: i64 = raw.parse().map_err(|err| {
                ParseError::invalid_format(*raw, "an invalid integer").with_cause(err)
            })?;
            out.push(Value::from(value));
        }
        Ok(collect_or_null(out))
    } else if types.permits(SchemaType::Number) {
        let mut out = Vec::new();
        for raw in values.iter().filter(|v| !v.is_empty()) {
            let value: f64 = raw.parse().map_err(|err| {
                ParseError::invalid_format(*raw, "an invalid number").with_cause(err)
            })?;
            match serde_json::Number::from_f64(value) {
                Some(number) => out.push(Value::Number(number)),
                None => {
                    return Err(ParseError::invalid_format(*raw, "an invalid number")
                        .with_cause("value out of range".to_string()))
                }
            }
        }
        Ok(collect_or_null(out))
    } else if types.permits(SchemaType::String) {
        Ok(Value::Array(
            values.iter().map(|v| Value::from(*v)).collect(),
        ))
    } else {
        Err(ParseError::other(format!(
            "unsupported parameter array type: {types}"
        )))
    }
}

fn collect_or_null(values: Vec<Value>) -> Value {
    if values.is_empty() {
        Value::Null
    } else {
        Value::Array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distinct_delimiters_require_exact_pairs() {
        let props = props_from_string("a=1;b=2", ";", "=").unwrap();
        assert_eq!(props.get("a"), Some(&"1".to_string()));
        assert_eq!(props.get("b"), Some(&"2".to_string()));

        assert!(props_from_string("a=1;b", ";", "=").is_err());
        assert!(props_from_string("a=1=2;b=3", ";", "=").is_err());
    }

    #[test]
    fn equal_delimiters_require_even_count() {
        let props = props_from_string("a,1,b,2", ",", ",").unwrap();
        assert_eq!(props.get("a"), Some(&"1".to_string()));
        assert_eq!(props.get("b"), Some(&"2".to_string()));

        assert!(props_from_string("a,1,b", ",", ",").is_err());
    }

    #[test]
    fn deep_set_creates_intermediate_objects() {
        let mut obj = Map::new();
        deep_set(&mut obj, &["a", "b", "c"], json!(1));
        deep_set(&mut obj, &["a", "b", "d"], json!(2));
        assert_eq!(Value::Object(obj), json!({ "a": { "b": { "c": 1, "d": 2 } } }));
    }

    #[test]
    fn deep_get_stops_at_scalars() {
        let value = json!({ "a": { "b": 5 } });
        let obj = value.as_object().unwrap();
        assert_eq!(deep_get(obj, &["a", "b"]), Some(&json!(5)));
        assert_eq!(deep_get(obj, &["a", "b", "c"]), Some(&json!(5)));
        assert_eq!(deep_get(obj, &["a", "x"]), None);
    }

    #[test]
    fn nested_schema_falls_back_to_additional_properties() {
        let raw = json!({
            "type": "object",
            "properties": {
                "settings": {
                    "type": "object",
                    "additionalProperties": { "type": "integer" }
                }
            }
        });
        let schema = SchemaRef::new(&raw);
        let nested = find_nested_schema(schema, &["settings", "volume"]).unwrap();
        assert!(nested.types().is(SchemaType::Integer));

        let err = find_nested_schema(schema, &["missing", "key"]).unwrap_err();
        assert_eq!(err, "nested schema for key \"missing\" not found");
    }

    #[test]
    fn assembles_scalar_and_array_properties() {
        let raw = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "count": { "type": "integer" },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        });
        let schema = SchemaRef::new(&raw);
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), "rust".to_string());
        props.insert("count".to_string(), "3".to_string());
        props.insert("tags".to_string(), format!("a{NESTED_DELIMITER}b"));

        let obj = make_object(&props, schema).unwrap();
        assert_eq!(
            Value::Object(obj),
            json!({ "name": "rust", "count": 3, "tags": ["a", "b"] })
        );
    }

    #[test]
    fn assembles_nested_object_properties() {
        let raw = json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "object",
                    "properties": {
                        "color": { "type": "string" },
                        "size": { "type": "integer" }
                    }
                }
            }
        });
        let schema = SchemaRef::new(&raw);
        let mut props = BTreeMap::new();
        props.insert(format!("filter{NESTED_DELIMITER}color"), "red".to_string());
        props.insert(format!("filter{NESTED_DELIMITER}size"), "10".to_string());

        let obj = make_object(&props, schema).unwrap();
        assert_eq!(
            Value::Object(obj),
            json!({ "filter": { "color": "red", "size": 10 } })
        );
    }

    #[test]
    fn integer_array_elements_are_converted() {
        let raw = json!({
            "type": "object",
            "properties": {
                "ids": { "type": "array", "items": { "type": "integer" } }
            }
        });
        let schema = SchemaRef::new(&raw);
        let mut props = BTreeMap::new();
        props.insert(
            "ids".to_string(),
            format!("1{NESTED_DELIMITER}2{NESTED_DELIMITER}3"),
        );
        let obj = make_object(&props, schema).unwrap();
        assert_eq!(Value::Object(obj), json!({ "ids": [1, 2, 3] }));
    }

    #[test]
    fn property_errors_carry_the_property_path() {
        let raw = json!({
            "type": "object",
            "properties": { "count": { "type": "integer" } }
        });
        let schema = SchemaRef::new(&raw);
        let mut props = BTreeMap::new();
        props.insert("count".to_string(), "abc".to_string());
        let err = make_object(&props, schema).unwrap_err();
        assert!(err.to_string().starts_with("path count:"), "{err}");
    }
}
