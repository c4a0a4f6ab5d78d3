use std::collections::HashMap;
use std::io::Read;

use http::header::HeaderMap;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::body::EncodingFn;
use crate::decode::{decode_value, QueryParamDecoder};
use crate::error::DecodeError;
use crate::param::encoding_serialization_method;
use crate::schema::{SchemaRef, SchemaType};

/// Decode an `application/x-www-form-urlencoded` body.
///
/// The schema must describe an object whose properties are scalars or
/// scalar arrays. Properties declared by `allOf`/`anyOf`/`oneOf` members are
/// decoded alongside the root schema's; two members decoding the same
/// property to different values is an error.
pub fn urlencoded_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    schema: SchemaRef<'_>,
    enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    if !schema.types().is(SchemaType::Object) {
        return Err(DecodeError::UnsupportedSchema {
            detail: "request body".to_string(),
        });
    }
    for (name, prop) in schema.properties() {
        let types = prop.types();
        if types.is(SchemaType::Object) {
            return Err(DecodeError::UnsupportedSchema {
                detail: format!("request body's property {name:?}"),
            });
        }
        if types.is(SchemaType::Array) {
            let items = prop.items_or_empty().types();
            let scalar = items.is(SchemaType::String)
                || items.is(SchemaType::Integer)
                || items.is(SchemaType::Number)
                || items.is(SchemaType::Boolean);
            if !scalar {
                return Err(DecodeError::UnsupportedSchema {
                    detail: format!("request body's property {name:?}"),
                });
            }
        }
    }

    let mut data = Vec::new();
    body.read_to_end(&mut data)?;
    let mut values: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in form_urlencoded::parse(&data) {
        values
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    let dec = QueryParamDecoder { values: &values };
    let mut obj = Map::new();

    decode_schema_constructs(&dec, &schema.all_of(), &mut obj, enc_fn)?;
    decode_schema_constructs(&dec, &schema.any_of(), &mut obj, enc_fn)?;
    decode_schema_constructs(&dec, &schema.one_of(), &mut obj, enc_fn)?;
    decode_schema_constructs(&dec, &[schema], &mut obj, enc_fn)?;

    Ok(Value::Object(obj))
}

/// Decode the properties declared by each schema into the object under
/// construction. Decoding failures skip the property (validation happens
/// downstream); conflicting values for a property already decoded by an
/// earlier member are an error.
fn decode_schema_constructs(
    dec: &QueryParamDecoder<'_>,
    schemas: &[SchemaRef<'_>],
    obj: &mut Map<String, Value>,
    enc_fn: Option<&EncodingFn>,
) -> Result<(), DecodeError> {
    for schema in schemas {
        for (name, prop) in schema.properties() {
            let enc = enc_fn.and_then(|f| f(name));
            let sm = encoding_serialization_method(enc.as_ref());
            let Ok((value, _)) = decode_value(dec, name, &sm, prop, false) else {
                continue;
            };
            let value = value.unwrap_or(Value::Null);
            if let Some(existing) = obj.get(name) {
                if *existing != value {
                    return Err(DecodeError::ConflictingProperty {
                        name: name.to_string(),
                    });
                }
            }
            obj.insert(name.to_string(), value);
        }
    }
    Ok(())
}
