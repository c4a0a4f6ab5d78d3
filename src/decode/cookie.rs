use std::collections::HashMap;

use serde_json::Value;

use crate::decode::object::{make_object, props_from_string};
use crate::decode::primitive::{parse_array, parse_primitive};
use crate::decode::ValueDecoder;
use crate::error::DecodeError;
use crate::param::{SerializationMethod, Style};
use crate::schema::SchemaRef;

/// Decodes values of cookie parameters. Only the `form` style is legal, and
/// compound values cannot be exploded (a cookie holds a single string).
pub struct CookieParamDecoder<'r> {
    pub cookies: &'r HashMap<String, String>,
}

impl ValueDecoder for CookieParamDecoder<'_> {
    fn decode_primitive(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Form {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let Some(raw) = self.cookies.get(name) else {
            return Ok((None, false));
        };
        let value = parse_primitive(raw, schema)?;
        Ok((value, true))
    }

    fn decode_array(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Form || sm.explode {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let Some(raw) = self.cookies.get(name) else {
            return Ok((None, false));
        };
        let parts: Vec<&str> = raw.split(',').collect();
        let value = parse_array(&parts, schema)?;
        Ok((value, true))
    }

    fn decode_object(
        &self,
        name: &str,
        sm: &SerializationMethod,
        schema: SchemaRef<'_>,
    ) -> Result<(Option<Value>, bool), DecodeError> {
        if sm.style != Style::Form || sm.explode {
            return Err(DecodeError::invalid_serialization(sm));
        }
        let Some(raw) = self.cookies.get(name) else {
            return Ok((None, false));
        };
        let props = props_from_string(raw, ",", ",")?;
        let obj = make_object(&props, schema)?;
        Ok((Some(Value::Object(obj)), true))
    }

    fn probe(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }
}
