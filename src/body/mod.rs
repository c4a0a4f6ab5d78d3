//! # Body Module
//!
//! Media-type dispatch for request bodies. A process-wide registry maps a
//! media-type string to a [`BodyDecoder`]; the built-in decoders cover JSON,
//! YAML, urlencoded forms, multipart forms, zip, csv, plain text and raw
//! octet streams. The registry is an initialization-time resource:
//! registering or unregistering decoders while another thread decodes is
//! outside the contract.

mod json;
mod multipart;
mod text;
mod urlencoded;
mod yaml;

pub use json::json_body_decoder;
pub use multipart::multipart_body_decoder;
pub use text::{csv_body_decoder, file_body_decoder, plain_body_decoder, zip_body_decoder};
pub use urlencoded::urlencoded_body_decoder;
pub use yaml::yaml_body_decoder;

use std::collections::HashMap;
use std::io::Read;
use std::sync::RwLock;

use http::header::{HeaderMap, CONTENT_TYPE};
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::error::{DecodeError, ParseError};
use crate::param::Encoding;
use crate::schema::SchemaRef;

/// Returns an encoding of a request body's part by name. `None` falls back
/// to the default form + explode serialization.
pub type EncodingFn = dyn Fn(&str) -> Option<Encoding>;

/// Decodes the body of a request or response into the common value domain:
/// a primitive, a sequence, or a string-keyed mapping.
pub type BodyDecoder = fn(
    &mut dyn Read,
    &HeaderMap,
    SchemaRef<'_>,
    Option<&EncodingFn>,
) -> Result<Value, DecodeError>;

static BODY_DECODERS: Lazy<RwLock<HashMap<String, BodyDecoder>>> = Lazy::new(|| {
    let mut decoders: HashMap<String, BodyDecoder> = HashMap::new();
    decoders.insert("application/json".to_string(), json_body_decoder);
    decoders.insert("application/json-patch+json".to_string(), json_body_decoder);
    decoders.insert("application/problem+json".to_string(), json_body_decoder);
    decoders.insert("application/octet-stream".to_string(), file_body_decoder);
    decoders.insert(
        "application/x-www-form-urlencoded".to_string(),
        urlencoded_body_decoder,
    );
    decoders.insert("application/x-yaml".to_string(), yaml_body_decoder);
    decoders.insert("application/yaml".to_string(), yaml_body_decoder);
    decoders.insert("application/zip".to_string(), zip_body_decoder);
    decoders.insert("multipart/form-data".to_string(), multipart_body_decoder);
    decoders.insert("text/csv".to_string(), csv_body_decoder);
    decoders.insert("text/plain".to_string(), plain_body_decoder);
    RwLock::new(decoders)
});

/// Register a body decoder for a media type, replacing any existing one.
///
/// Registration is an initialization-time operation; it must complete before
/// any decode begins.
///
/// # Panics
///
/// Panics when `content_type` is empty.
pub fn register_body_decoder(content_type: &str, decoder: BodyDecoder) {
    if content_type.is_empty() {
        panic!("content type is empty");
    }
    debug!("registering body decoder for {content_type:?}");
    BODY_DECODERS
        .write()
        .expect("body decoder registry poisoned")
        .insert(content_type.to_string(), decoder);
}

/// Dissociate a media type from its body decoder. Decoding that media type
/// afterwards yields an unsupported-format error.
///
/// # Panics
///
/// Panics when `content_type` is empty.
pub fn unregister_body_decoder(content_type: &str) {
    if content_type.is_empty() {
        panic!("content type is empty");
    }
    debug!("unregistering body decoder for {content_type:?}");
    BODY_DECODERS
        .write()
        .expect("body decoder registry poisoned")
        .remove(content_type);
}

/// The decoder registered for a media type, if any.
pub fn registered_body_decoder(content_type: &str) -> Option<BodyDecoder> {
    BODY_DECODERS
        .read()
        .expect("body decoder registry poisoned")
        .get(content_type)
        .copied()
}

/// Decode a body stream according to its `Content-Type` header.
///
/// Media-type parameters such as `charset` are stripped before lookup.
/// Returns the bare media type alongside the decoded value.
pub fn decode_body(
    body: &mut dyn Read,
    headers: &HeaderMap,
    schema: SchemaRef<'_>,
    enc_fn: Option<&EncodingFn>,
) -> Result<(String, Value), DecodeError> {
    let content_type = match headers.get(CONTENT_TYPE) {
        Some(value) => value.to_str().map_err(|err| {
            ParseError::new(crate::error::ParseErrorKind::InvalidFormat)
                .with_reason("the content type is not valid text")
                .with_cause(err)
        })?,
        None => "",
    };
    let media_type = parse_media_type(content_type);
    let Some(decoder) = registered_body_decoder(&media_type) else {
        return Err(ParseError::unsupported_format(format!(
            "unsupported content type {media_type:?}"
        ))
        .into());
    };
    debug!("decoding body as {media_type:?}");
    let value = decoder(body, headers, schema, enc_fn)?;
    Ok((media_type, value))
}

/// The bare media type of a `Content-Type` value, lowercased, with
/// parameters stripped.
pub(crate) fn parse_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// A named parameter of a `Content-Type` or `Content-Disposition` value,
/// with surrounding quotes removed.
pub(crate) fn media_type_param(value: &str, name: &str) -> Option<String> {
    for part in value.split(';').skip(1) {
        let Some((key, param)) = part.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case(name) {
            return Some(param.trim().trim_matches('"').to_string());
        }
    }
    None
}
