//! # oaswire
//!
//! Decoding of HTTP request parameters and bodies against an OpenAPI 3
//! contract. Raw wire inputs (path segments, query strings, headers,
//! cookies and body byte streams) are transformed into `serde_json::Value`
//! trees directed by a schema, implementing the OpenAPI serialization rules
//! (styles and `explode`), schema composition (`allOf`/`anyOf`/`oneOf`) and
//! a pluggable registry of media-type body decoders.
//!
//! The crate emits values; validating them against the full JSON Schema is
//! the caller's concern.

pub mod body;
pub mod decode;
pub mod error;
pub mod param;
pub mod request;
pub mod schema;

pub use body::{
    decode_body, register_body_decoder, registered_body_decoder, unregister_body_decoder,
    BodyDecoder, EncodingFn,
};
pub use error::{DecodeError, ParseError, ParseErrorKind, PathSegment};
pub use param::{
    decode_parameter, decode_styled_parameter, default_content_parameter_decoder,
    ContentParameterDecoder, DecodeOptions, DecodedParameter, Encoding, MediaTypeObject,
    Parameter, ParameterLocation, SerializationMethod, Style,
};
pub use request::RequestInput;
pub use schema::{AdditionalProperties, SchemaRef, SchemaType, TypeSet};
