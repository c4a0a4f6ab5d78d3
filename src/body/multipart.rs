use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::{Map, Value};

use crate::body::{decode_body, media_type_param, EncodingFn};
use crate::error::{DecodeError, ParseError, ParseErrorKind};
use crate::schema::{AdditionalProperties, SchemaRef, SchemaType};

/// Decode a `multipart/form-data` body.
///
/// Each part is matched to a property of the object schema by its form name
/// and recursively decoded with its own headers; a part without a
/// `Content-Type` is treated as `text/plain`. Parts sharing a name under an
/// array-typed property aggregate into one array; scalar properties take
/// the first part's value.
pub fn multipart_body_decoder(
    body: &mut dyn Read,
    headers: &HeaderMap,
    schema: SchemaRef<'_>,
    enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    if !schema.types().is(SchemaType::Object) {
        return Err(DecodeError::UnsupportedSchema {
            detail: "request body".to_string(),
        });
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let boundary = media_type_param(content_type, "boundary").unwrap_or_default();
    if boundary.is_empty() {
        return Err(ParseError::new(ParseErrorKind::InvalidFormat)
            .with_reason("no boundary parameter in the content type")
            .into());
    }

    let mut data = Vec::new();
    body.read_to_end(&mut data)?;
    let parts = parse_parts(&data, &boundary)?;

    let all_of = schema.all_of();
    let mut values: HashMap<String, Vec<Value>> = HashMap::new();

    for mut part in parts {
        let name = part.name.clone();
        let enc = enc_fn.and_then(|f| f(&name));
        let sub_enc = move |_: &str| enc.clone();

        let value_schema = if !all_of.is_empty() {
            match all_of.iter().find_map(|member| member.property(&name)) {
                Some(found) => found,
                None => return Err(undefined_part(&name)),
            }
        } else {
            match schema.property(&name) {
                Some(found) => adjust_for_array(found),
                None => match schema.additional_properties() {
                    AdditionalProperties::Flag(true) => continue,
                    AdditionalProperties::Flag(false) | AdditionalProperties::Unset => {
                        return Err(undefined_part(&name))
                    }
                    AdditionalProperties::Schema(fallback) => match fallback.property(&name) {
                        Some(found) => adjust_for_array(found),
                        None => return Err(undefined_part(&name)),
                    },
                },
            }
        };

        if !part.headers.contains_key(CONTENT_TYPE) {
            part.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        }
        let mut reader = part.data.as_slice();
        match decode_body(&mut reader, &part.headers, value_schema, Some(&sub_enc)) {
            Ok((_, value)) => values.entry(name).or_default().push(value),
            Err(DecodeError::Parse(err)) => {
                return Err(ParseError::wrap_prop(name, err).into());
            }
            Err(err) => return Err(DecodeError::Other(format!("part {name}: {err}"))),
        }
    }

    let mut all_properties: BTreeMap<&str, SchemaRef<'_>> = BTreeMap::new();
    if !all_of.is_empty() {
        for member in &all_of {
            for (name, prop) in member.properties() {
                all_properties.insert(name, prop);
            }
            if let Some(fallback) = member.additional_properties().schema() {
                for (name, prop) in fallback.properties() {
                    all_properties.insert(name, prop);
                }
            }
        }
    } else {
        for (name, prop) in schema.properties() {
            all_properties.insert(name, prop);
        }
        if let Some(fallback) = schema.additional_properties().schema() {
            for (name, prop) in fallback.properties() {
                all_properties.insert(name, prop);
            }
        }
    }

    let mut obj = Map::new();
    for (name, prop) in all_properties {
        let Some(decoded) = values.remove(name) else {
            continue;
        };
        if decoded.is_empty() {
            continue;
        }
        if prop.types().is(SchemaType::Array) {
            obj.insert(name.to_string(), Value::Array(decoded));
        } else if let Some(first) = decoded.into_iter().next() {
            obj.insert(name.to_string(), first);
        }
    }

    Ok(Value::Object(obj))
}

/// A form with several same-named parts declares them through one
/// array-typed property; each individual part then follows the items
/// schema.
fn adjust_for_array(schema: SchemaRef<'_>) -> SchemaRef<'_> {
    if schema.types().is(SchemaType::Array) {
        schema.items_or_empty()
    } else {
        schema
    }
}

fn undefined_part(name: &str) -> DecodeError {
    ParseError::new(ParseErrorKind::Other)
        .with_cause(format!("part {name}: undefined"))
        .into()
}

#[derive(Debug)]
struct Part {
    name: String,
    headers: HeaderMap,
    data: Vec<u8>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Split a buffered multipart body into its parts.
fn parse_parts(data: &[u8], boundary: &str) -> Result<Vec<Part>, ParseError> {
    let delimiter = format!("--{boundary}");
    let delim = delimiter.as_bytes();
    let closing = [b"\r\n".as_slice(), delim].concat();

    let Some(start) = find(data, delim) else {
        return Err(ParseError::new(ParseErrorKind::InvalidFormat)
            .with_reason("the body contains no multipart boundary"));
    };
    let mut rest = &data[start + delim.len()..];

    let mut parts = Vec::new();
    loop {
        if rest.starts_with(b"--") {
            break;
        }
        let Some(after_line) = rest.strip_prefix(b"\r\n") else {
            return Err(ParseError::new(ParseErrorKind::InvalidFormat)
                .with_reason("a boundary must be followed by a line break"));
        };
        let (header_block, body_rest) = if let Some(no_headers) = after_line.strip_prefix(b"\r\n") {
            (&[][..], no_headers)
        } else {
            let Some(header_end) = find(after_line, b"\r\n\r\n") else {
                return Err(ParseError::new(ParseErrorKind::InvalidFormat)
                    .with_reason("a part must separate its headers with a blank line"));
            };
            (&after_line[..header_end], &after_line[header_end + 4..])
        };
        let Some(end) = find(body_rest, &closing) else {
            return Err(ParseError::new(ParseErrorKind::InvalidFormat)
                .with_reason("a part is not terminated by the boundary"));
        };

        let headers = parse_part_headers(header_block)?;
        let disposition = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        let name = media_type_param(disposition, "name").unwrap_or_default();

        parts.push(Part {
            name,
            headers,
            data: body_rest[..end].to_vec(),
        });
        rest = &body_rest[end + closing.len()..];
    }
    Ok(parts)
}

fn parse_part_headers(block: &[u8]) -> Result<HeaderMap, ParseError> {
    let mut headers = HeaderMap::new();
    if block.is_empty() {
        return Ok(headers);
    }
    let text = std::str::from_utf8(block).map_err(|err| {
        ParseError::new(ParseErrorKind::InvalidFormat)
            .with_reason("part headers are not valid text")
            .with_cause(err)
    })?;
    for line in text.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(ParseError::invalid_format(
                line,
                "a part header must have the form name: value",
            ));
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
            ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err)
        })?;
        let value = HeaderValue::from_str(value.trim()).map_err(|err| {
            ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err)
        })?;
        headers.append(name, value);
    }
    Ok(headers)
}
