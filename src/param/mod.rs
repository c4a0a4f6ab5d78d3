//! # Parameter Module
//!
//! Parameter metadata and the decoding facade. A [`Parameter`] describes one
//! declared operation parameter; [`decode_parameter`] turns its raw request
//! representation into a `serde_json::Value`, selecting between *styled*
//! decoding (a `schema` plus a serialization style) and *content-based*
//! decoding (a `content` map from media type to schema). The two paths never
//! interleave.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::decode::{
    decode_value, CookieParamDecoder, HeaderParamDecoder, PathParamDecoder, QueryParamDecoder,
};
use crate::error::DecodeError;
use crate::request::RequestInput;
use crate::schema::{SchemaRef, SchemaType};

/// Location where a parameter can be found in an HTTP request.
///
/// Corresponds to the OpenAPI `in` field for parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter (e.g., `/users/{id}`)
    Path,
    /// Query string parameter (e.g., `?limit=10`)
    Query,
    /// HTTP header parameter
    Header,
    /// Cookie parameter
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        f.write_str(s)
    }
}

/// Serialization style for parameters as defined by OpenAPI.
///
/// Determines how arrays and objects are laid out on the wire in each
/// parameter location. See: https://spec.openapis.org/oas/v3.1.0#style-values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Comma-separated values (default for path and header)
    Simple,
    /// Dot-prefixed path values (e.g., `.blue.green`)
    Label,
    /// Semicolon-prefixed path values (e.g., `;color=blue`)
    Matrix,
    /// Ampersand-separated query values (default for query and cookie)
    Form,
    /// Space-delimited arrays (e.g., `blue green`)
    SpaceDelimited,
    /// Pipe-delimited arrays (e.g., `blue|green`)
    PipeDelimited,
    /// Nested objects as bracketed query keys (e.g., `color[R]=100`)
    DeepObject,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Simple => "simple",
            Style::Label => "label",
            Style::Matrix => "matrix",
            Style::Form => "form",
            Style::SpaceDelimited => "spaceDelimited",
            Style::PipeDelimited => "pipeDelimited",
            Style::DeepObject => "deepObject",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (style, explode) pair governing one parameter's wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationMethod {
    pub style: Style,
    pub explode: bool,
}

/// Per-property serialization metadata for form-encoded request bodies.
///
/// Mirrors the OpenAPI `encoding` object; a caller-supplied function maps a
/// property name to its [`Encoding`] when decoding urlencoded and multipart
/// bodies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "contentType")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
}

impl Encoding {
    /// Resolve the serialization method, defaulting to form + explode the
    /// way OpenAPI defaults body properties.
    pub fn serialization_method(&self) -> SerializationMethod {
        SerializationMethod {
            style: self.style.unwrap_or(Style::Form),
            explode: self.explode.unwrap_or(true),
        }
    }
}

pub(crate) fn encoding_serialization_method(enc: Option<&Encoding>) -> SerializationMethod {
    match enc {
        Some(enc) => enc.serialization_method(),
        None => SerializationMethod {
            style: Style::Form,
            explode: true,
        },
    }
}

/// One entry of a parameter's `content` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaTypeObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Metadata for a single operation parameter.
///
/// Carries either a `schema` (with an associated serialization style) or a
/// `content` map; never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<HashMap<String, MediaTypeObject>>,
}

impl Parameter {
    /// Resolve the effective serialization method, applying the OpenAPI
    /// per-location defaults when style or explode are unset.
    pub fn serialization_method(&self) -> SerializationMethod {
        match self.location {
            ParameterLocation::Path | ParameterLocation::Header => SerializationMethod {
                style: self.style.unwrap_or(Style::Simple),
                explode: self.explode.unwrap_or(false),
            },
            ParameterLocation::Query | ParameterLocation::Cookie => SerializationMethod {
                style: self.style.unwrap_or(Style::Form),
                explode: self.explode.unwrap_or(true),
            },
        }
    }
}

/// Replacement decoder for content-based parameters.
///
/// Receives the parameter and its raw values, returns the decoded value and
/// the schema it was decoded against.
pub type ContentParameterDecoder = dyn Fn(&Parameter, &[String]) -> Result<(Value, Value), DecodeError>;

/// Per-request options for [`decode_parameter`].
#[derive(Default)]
pub struct DecodeOptions<'a> {
    /// Overrides the default `application/json` decoder for parameters
    /// declared via `content`.
    pub param_decoder: Option<&'a ContentParameterDecoder>,
}

/// Outcome of decoding one parameter.
#[derive(Debug)]
pub struct DecodedParameter {
    /// The decoded value; `None` when the parameter was absent or empty.
    pub value: Option<Value>,
    /// The schema the value was decoded against, for content-based
    /// parameters.
    pub schema: Option<Value>,
    /// Whether the request surface contained the parameter at all.
    pub found: bool,
}

/// Decode one declared parameter from the request surface.
///
/// Content-based parameters go through their `content` map (only
/// `application/json` is understood by the default decoder); everything else
/// is decoded by serialization style. A parameter that is `required` but
/// absent yields [`DecodeError::RequiredMissing`].
pub fn decode_parameter(
    param: &Parameter,
    input: &RequestInput,
    options: &DecodeOptions<'_>,
) -> Result<DecodedParameter, DecodeError> {
    debug!(
        "decoding {} parameter {:?}",
        param.location, param.name
    );
    if param.content.is_some() {
        return decode_content_parameter(param, input, options);
    }
    let (value, found) = decode_styled_parameter(param, input)?;
    if !found && param.required {
        return Err(DecodeError::RequiredMissing {
            name: param.name.clone(),
        });
    }
    Ok(DecodedParameter {
        value,
        schema: None,
        found,
    })
}

/// Decode a parameter defined with a schema and a serialization style.
///
/// Returns the decoded value and whether the parameter was present in the
/// input surface at all (even if empty-valued).
pub fn decode_styled_parameter(
    param: &Parameter,
    input: &RequestInput,
) -> Result<(Option<Value>, bool), DecodeError> {
    let sm = param.serialization_method();
    let schema = param
        .schema
        .as_ref()
        .map(SchemaRef::new)
        .unwrap_or_else(SchemaRef::empty);

    match param.location {
        ParameterLocation::Path => {
            if input.path_params.is_empty() {
                return Ok((None, false));
            }
            let dec = PathParamDecoder {
                path_params: &input.path_params,
            };
            decode_value(&dec, &param.name, &sm, schema, param.required)
        }
        ParameterLocation::Query => {
            if input.query.is_empty() {
                return Ok((None, false));
            }
            let dec = QueryParamDecoder {
                values: &input.query,
            };
            decode_value(&dec, &param.name, &sm, schema, param.required)
        }
        ParameterLocation::Header => {
            let dec = HeaderParamDecoder {
                headers: &input.headers,
            };
            decode_value(&dec, &param.name, &sm, schema, param.required)
        }
        ParameterLocation::Cookie => {
            let dec = CookieParamDecoder {
                cookies: &input.cookies,
            };
            decode_value(&dec, &param.name, &sm, schema, param.required)
        }
    }
}

fn decode_content_parameter(
    param: &Parameter,
    input: &RequestInput,
    options: &DecodeOptions<'_>,
) -> Result<DecodedParameter, DecodeError> {
    let (values, found): (Vec<String>, bool) = match param.location {
        ParameterLocation::Path => match input.path_params.get(&param.name) {
            Some(value) => (vec![value.clone()], true),
            None => (Vec::new(), false),
        },
        ParameterLocation::Query => match input.query.get(&param.name) {
            Some(values) => (values.clone(), true),
            None => (Vec::new(), false),
        },
        ParameterLocation::Header => {
            let mut values = Vec::new();
            for value in input.headers.get_all(param.name.as_str()) {
                if let Ok(text) = value.to_str() {
                    values.push(text.to_string());
                }
            }
            let found = !values.is_empty();
            (values, found)
        }
        ParameterLocation::Cookie => match input.cookies.get(&param.name) {
            Some(value) => (vec![value.clone()], true),
            None => (Vec::new(), false),
        },
    };

    if !found {
        if param.required {
            return Err(DecodeError::RequiredMissing {
                name: param.name.clone(),
            });
        }
        return Ok(DecodedParameter {
            value: None,
            schema: None,
            found: false,
        });
    }

    let (value, schema) = match options.param_decoder {
        Some(decoder) => decoder(param, &values)?,
        None => default_content_parameter_decoder(param, &values)?,
    };
    Ok(DecodedParameter {
        value: Some(value),
        schema: Some(schema),
        found: true,
    })
}

/// The built-in decoder for content-based parameters.
///
/// Understands a single `application/json` content entry. A value that fails
/// to parse as JSON falls back to the raw string unless the schema requires
/// an object.
pub fn default_content_parameter_decoder(
    param: &Parameter,
    values: &[String],
) -> Result<(Value, Value), DecodeError> {
    if values.len() > 1 && param.location != ParameterLocation::Query {
        return Err(DecodeError::ContentParameter {
            name: param.name.clone(),
            reason: format!("a {} parameter cannot have multiple values", param.location),
        });
    }
    let Some(content) = &param.content else {
        return Err(DecodeError::ContentParameter {
            name: param.name.clone(),
            reason: "expected to have content".to_string(),
        });
    };
    if content.len() != 1 {
        return Err(DecodeError::ContentParameter {
            name: param.name.clone(),
            reason: "multiple content types".to_string(),
        });
    }
    let Some(media) = content.get("application/json") else {
        return Err(DecodeError::ContentParameter {
            name: param.name.clone(),
            reason: "no content schema".to_string(),
        });
    };
    let schema = media.schema.clone().unwrap_or(Value::Null);
    let schema_ref = SchemaRef::new(&schema);

    let unmarshal = |encoded: &str, target: Option<SchemaRef<'_>>| -> Result<Value, DecodeError> {
        match serde_json::from_str(encoded) {
            Ok(value) => Ok(value),
            Err(_) => {
                if let Some(target) = target {
                    if !target.types().is(SchemaType::Object) {
                        return Ok(Value::from(encoded));
                    }
                }
                Err(DecodeError::ContentParameter {
                    name: param.name.clone(),
                    reason: "error unmarshaling value".to_string(),
                })
            }
        }
    };

    let value = if values.len() == 1 {
        unmarshal(&values[0], Some(schema_ref))?
    } else {
        let items = schema_ref.items();
        let mut array = Vec::with_capacity(values.len());
        for raw in values {
            array.push(unmarshal(raw, items)?);
        }
        Value::Array(array)
    };
    Ok((value, schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialization_method_defaults_per_location() {
        let param: Parameter =
            serde_json::from_value(json!({ "name": "id", "in": "path" })).unwrap();
        let sm = param.serialization_method();
        assert_eq!(sm.style, Style::Simple);
        assert!(!sm.explode);

        let param: Parameter =
            serde_json::from_value(json!({ "name": "tag", "in": "query" })).unwrap();
        let sm = param.serialization_method();
        assert_eq!(sm.style, Style::Form);
        assert!(sm.explode);
    }

    #[test]
    fn style_names_round_trip() {
        let style: Style = serde_json::from_value(json!("deepObject")).unwrap();
        assert_eq!(style, Style::DeepObject);
        assert_eq!(style.as_str(), "deepObject");
    }

    #[test]
    fn encoding_defaults_to_form_exploded() {
        let enc = Encoding::default();
        let sm = enc.serialization_method();
        assert_eq!(sm.style, Style::Form);
        assert!(sm.explode);
    }
}
