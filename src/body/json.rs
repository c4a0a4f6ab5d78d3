use std::io::Read;

use http::header::HeaderMap;
use serde_json::Value;

use crate::body::EncodingFn;
use crate::error::{DecodeError, ParseError, ParseErrorKind};
use crate::schema::SchemaRef;

/// Decode a JSON body.
///
/// Numbers keep their decimal text instead of being coerced to doubles, so
/// large or high-precision values survive until a schema forces a concrete
/// numeric type. Public so that additional JSON-based media types can be
/// registered against it.
pub fn json_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    serde_json::from_reader(body).map_err(|err| {
        ParseError::new(ParseErrorKind::InvalidFormat)
            .with_cause(err)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(input: &str) -> Result<Value, DecodeError> {
        let schema = json!({});
        json_body_decoder(
            &mut input.as_bytes(),
            &HeaderMap::new(),
            SchemaRef::new(&schema),
            None,
        )
    }

    #[test]
    fn decodes_objects() {
        let value = decode(r#"{"a": 1, "b": ["x"]}"#).unwrap();
        assert_eq!(value, json!({ "a": 1, "b": ["x"] }));
    }

    #[test]
    fn preserves_out_of_range_numbers() {
        let value = decode(r#"{"n": 1e309}"#).unwrap();
        let n = value.get("n").unwrap();
        assert!(n.is_number());
        assert_eq!(n.to_string(), "1e309");
    }

    #[test]
    fn syntax_errors_are_invalid_format() {
        let err = decode("{").unwrap_err();
        let parse = err.as_parse_error().expect("parse error");
        assert_eq!(parse.kind, ParseErrorKind::InvalidFormat);
    }
}
