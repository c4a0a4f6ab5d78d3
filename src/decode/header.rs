use http::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use crate::decode::object::{make_object, props_from_string};
use crate::decode::primitive::{parse_array, parse_primitive};
use crate::decode::ValueDecoder;
use crate::error::{DecodeError, ParseError};
use crate::param::{SerializationMethod, Style};
use crate::schema::SchemaRef;

/// Decodes values of header parameters. Only the `simple` style is legal.
pub struct HeaderParamDecoder<'r> {
    pub headers: &'r HeaderMap,
}

fn header_text(value: &HeaderValue) -> Result<&str, ParseError> {
    value.to_str().map_err(|err| {
        ParseError::new(crate::error::ParseErrorKind::InvalidFormat)
            .with_reason("a header value is not valid text")
            .with_cause(err)
    })
}

impl HeaderParamDecoder<'_> {
    fn raw(&self, name: &str) -> Result<(Option<&str>, bool), ParseError> {
        let found = self.headers.contains_key(name);
        match self.headers.get(name) {
            Some(value) => Ok((Some(header_text(value)?), found)),
            None => Ok((None, found)),
        }
    }
}

impl ValueDecoder for HeaderParamDecoder<'_> {
    fn decode_primitive(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Simple {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let (raw, found) = self.raw(name)?;
        let Some(raw) = raw else {
            return Ok((None, found));
        };
        let value = parse_primitive(raw, schema)?;
        Ok((value, found))
    }

    fn decode_array(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Simple {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let (raw, found) = self.raw(name)?;
        let Some(raw) = raw else {
            return Ok((None, found));
        };
        let parts: Vec<&str> = raw.split(',').collect();
        let value = parse_array(&parts, schema)?;
        Ok((value, found))
    }

    fn decode_object(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Simple {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let value_delim = if sm.explode { "=" } else { "," };
        let (raw, found) = self.raw(name)?;
        let Some(raw) = raw else {
            return Ok((None, found));
        };
        let props = props_from_string(raw, ",", value_delim)?;
        let obj = make_object(&props, schema)?;
        Ok((Some(Value::Object(obj)), found))
    }

    fn probe(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }
}
