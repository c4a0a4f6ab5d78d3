//! # Decode Module
//!
//! The schema-directed decoding core. Four location decoders (path, query,
//! header, cookie) expose the same three operations parameterized by a
//! [`SerializationMethod`]; [`decode_value`] chooses among them by the
//! schema's type set and resolves `allOf`/`anyOf`/`oneOf` composition on the
//! way down.

mod cookie;
mod header;
mod object;
mod path;
mod primitive;
mod query;

pub use cookie::CookieParamDecoder;
pub use header::HeaderParamDecoder;
pub use object::{make_object, props_from_string, NESTED_DELIMITER};
pub use path::PathParamDecoder;
pub use primitive::{parse_array, parse_primitive};
pub use query::QueryParamDecoder;

use serde_json::Value;

use crate::error::{DecodeError, ParseError};
use crate::param::SerializationMethod;
use crate::schema::{SchemaRef, SchemaType};

/// The three-operation capability set every parameter location implements.
///
/// Each operation returns the decoded value (if any) and whether the input
/// surface contained the parameter name at all, even empty-valued; the
/// facade uses the latter to enforce `required`.
pub trait ValueDecoder {
    fn decode_primitive(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError>;

    fn decode_array(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError>;

    fn decode_object(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError>;

    /// Whether the underlying surface contains the parameter name at all.
    fn probe(&self, name: &str) -> bool;
}

/// Decode one parameter value, dispatching on the schema.
///
/// Composition keywords are resolved first: `allOf` keeps the last decoded
/// value and stops at the first null or error; `anyOf` returns the first
/// member that yields a value; `oneOf` returns a matching member's value
/// without complaining about multiple matches (the body-side
/// `parse_value` is stricter). A `not` schema is not implemented. With no
/// composition, the type set picks the array, object or primitive
/// operation; an untyped schema only probes for presence, unless it carries
/// a `pattern`, in which case the raw value is run through the primitive
/// path so the pattern can match downstream.
pub fn decode_value(
    dec: &dyn ValueDecoder,
    name: &str,
    sm: &SerializationMethod,
    schema: SchemaRef<'_>,
    required: bool,
) -> Result<(Option<Value>, bool), DecodeError> {
    let all_of = schema.all_of();
    if !all_of.is_empty() {
        let mut found = false;
        let mut value = None;
        for member in all_of {
            let (v, f) = decode_value(dec, name, sm, member, required)?;
            found = found || f;
            value = v;
            if value.is_none() {
                break;
            }
        }
        return Ok((value, found));
    }

    let any_of = schema.any_of();
    if !any_of.is_empty() {
        let mut found = false;
        for member in any_of {
            if let Ok((value, f)) = decode_value(dec, name, sm, member, required) {
                found = found || f;
                if value.is_some() {
                    return Ok((value, found));
                }
            }
        }
        if required {
            return Err(DecodeError::Alternatives {
                keyword: "anyOf",
                name: name.to_string(),
            });
        }
        return Ok((None, found));
    }

    let one_of = schema.one_of();
    if !one_of.is_empty() {
        let mut found = false;
        let mut matched = 0usize;
        let mut value = None;
        for member in one_of {
            if let Ok((v, f)) = decode_value(dec, name, sm, member, required) {
                found = found || f;
                if v.is_some() {
                    value = v;
                    matched += 1;
                }
            }
        }
        if matched >= 1 {
            return Ok((value, found));
        }
        if required {
            return Err(DecodeError::Alternatives {
                keyword: "oneOf",
                name: name.to_string(),
            });
        }
        return Ok((None, found));
    }

    if schema.not_schema().is_some() {
        return Err(ParseError::unsupported_format("not implemented: decoding 'not'").into());
    }

    let types = schema.types();
    if !types.is_empty() {
        return if types.is(SchemaType::Array) {
            dec.decode_array(name, sm, schema)
        } else if types.is(SchemaType::Object) {
            dec.decode_object(name, sm, schema)
        } else {
            dec.decode_primitive(name, sm, schema)
        };
    }

    if schema.pattern().is_some() {
        return dec.decode_primitive(name, sm, schema);
    }
    Ok((None, dec.probe(name)))
}
