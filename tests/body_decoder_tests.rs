use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use oaswire::schema::SchemaRef;
use oaswire::{decode_body, DecodeError, ParseErrorKind};
use serde_json::{json, Value};

fn headers(content_type: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
    map
}

fn decode(content_type: &str, body: &[u8], schema: &Value) -> Result<(String, Value), DecodeError> {
    decode_body(
        &mut &body[..],
        &headers(content_type),
        SchemaRef::new(schema),
        None,
    )
}

#[test]
fn test_json_body() {
    let schema = json!({ "type": "object" });
    let (media_type, value) =
        decode("application/json", br#"{"a": 1, "b": [true]}"#, &schema).unwrap();
    assert_eq!(media_type, "application/json");
    assert_eq!(value, json!({ "a": 1, "b": [true] }));
}

#[test]
fn test_json_media_type_parameters_are_stripped() {
    let schema = json!({});
    let (media_type, value) =
        decode("application/json; charset=utf-8", b"[1, 2]", &schema).unwrap();
    assert_eq!(media_type, "application/json");
    assert_eq!(value, json!([1, 2]));
}

#[test]
fn test_json_numbers_survive_decoding() {
    let schema = json!({});
    let (_, value) = decode("application/json", br#"{"n": 1e309}"#, &schema).unwrap();
    let n = value.get("n").unwrap();
    assert!(n.is_number());
    assert_eq!(n.to_string(), "1e309");
}

#[test]
fn test_json_syntax_error_is_invalid_format() {
    let schema = json!({});
    let err = decode("application/json", b"{oops", &schema).unwrap_err();
    let parse = err.as_parse_error().expect("parse error");
    assert_eq!(parse.kind, ParseErrorKind::InvalidFormat);
}

#[test]
fn test_yaml_body() {
    let schema = json!({ "type": "object" });
    let (media_type, value) = decode("application/yaml", b"a: 1\nb:\n  - x\n", &schema).unwrap();
    assert_eq!(media_type, "application/yaml");
    assert_eq!(value, json!({ "a": 1, "b": ["x"] }));
}

#[test]
fn test_plain_text_body() {
    let schema = json!({ "type": "string" });
    let (_, value) = decode("text/plain; charset=utf-8", b"hello there", &schema).unwrap();
    assert_eq!(value, json!("hello there"));
}

#[test]
fn test_octet_stream_body() {
    let schema = json!({ "type": "string" });
    let (_, value) = decode("application/octet-stream", b"\x00binary\x01", &schema).unwrap();
    assert!(value.is_string());
}

#[test]
fn test_csv_body() {
    let schema = json!({ "type": "string" });
    let (_, value) = decode("text/csv", b"a,b,c\nd,e,f\n", &schema).unwrap();
    assert_eq!(value, json!("a,b,c\nd,e,f\n"));
}

#[test]
fn test_unknown_media_type_mentions_the_bare_type() {
    let schema = json!({});
    let err = decode("application/vnd.acme+avro; charset=utf-8", b"", &schema).unwrap_err();
    let parse = err.as_parse_error().expect("parse error");
    assert_eq!(parse.kind, ParseErrorKind::UnsupportedFormat);
    assert_eq!(
        err.to_string(),
        "unsupported content type \"application/vnd.acme+avro\""
    );
}

#[test]
fn test_urlencoded_body() -> anyhow::Result<()> {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "count": { "type": "integer" },
            "tags": { "type": "array", "items": { "type": "string" } }
        }
    });
    let (_, value) = decode(
        "application/x-www-form-urlencoded",
        b"name=rust&count=3&tags=a&tags=b",
        &schema,
    )?;
    assert_eq!(
        value,
        json!({ "name": "rust", "count": 3, "tags": ["a", "b"] })
    );
    Ok(())
}

#[test]
fn test_urlencoded_rejects_object_properties() {
    let schema = json!({
        "type": "object",
        "properties": { "meta": { "type": "object" } }
    });
    let err = decode("application/x-www-form-urlencoded", b"meta=x", &schema).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported schema of request body's property \"meta\""
    );
}
