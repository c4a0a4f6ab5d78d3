use oaswire::{
    decode_parameter, DecodeError, DecodeOptions, Parameter, RequestInput,
};
use serde_json::{json, Value};

fn param(raw: Value) -> Parameter {
    serde_json::from_value(raw).expect("parameter definition")
}

fn decode(p: &Parameter, input: &RequestInput) -> Result<(Option<Value>, bool), DecodeError> {
    decode_parameter(p, input, &DecodeOptions::default()).map(|d| (d.value, d.found))
}

#[test]
fn test_path_matrix_integer_array() {
    let p = param(json!({
        "name": "id",
        "in": "path",
        "style": "matrix",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_path_param("id", ";id=1,2,3");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(found);
    assert_eq!(value, Some(json!([1, 2, 3])));
}

#[test]
fn test_path_matrix_exploded_array() {
    let p = param(json!({
        "name": "id",
        "in": "path",
        "style": "matrix",
        "explode": true,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_path_param("id", ";id=1;id=2;id=3");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!([1, 2, 3])));
}

#[test]
fn test_path_label_exploded_string_array() {
    let p = param(json!({
        "name": "color",
        "in": "path",
        "style": "label",
        "explode": true,
        "schema": { "type": "array", "items": { "type": "string" } }
    }));
    let input = RequestInput::new().with_path_param("color", ".red.green");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!(["red", "green"])));
}

#[test]
fn test_path_simple_object() {
    let p = param(json!({
        "name": "point",
        "in": "path",
        "style": "simple",
        "explode": false,
        "schema": {
            "type": "object",
            "properties": {
                "x": { "type": "integer" },
                "y": { "type": "integer" }
            }
        }
    }));
    let input = RequestInput::new().with_path_param("point", "x,1,y,2");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!({ "x": 1, "y": 2 })));
}

#[test]
fn test_query_form_array_csv() {
    let p = param(json!({
        "name": "color",
        "in": "query",
        "style": "form",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "string" } }
    }));
    let input = RequestInput::new().with_query_string("color=blue,black,brown");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!(["blue", "black", "brown"])));
}

#[test]
fn test_query_form_array_exploded() {
    let p = param(json!({
        "name": "color",
        "in": "query",
        "schema": { "type": "array", "items": { "type": "string" } }
    }));
    let input = RequestInput::new().with_query_string("color=blue&color=black");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!(["blue", "black"])));
}

#[test]
fn test_query_pipe_delimited_array() {
    let p = param(json!({
        "name": "id",
        "in": "query",
        "style": "pipeDelimited",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_query_string("id=3%7C4%7C5");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!([3, 4, 5])));
}

#[test]
fn test_query_space_delimited_array() {
    let p = param(json!({
        "name": "id",
        "in": "query",
        "style": "spaceDelimited",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_query_string("id=3%204%205");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!([3, 4, 5])));
}

#[test]
fn test_header_simple_exploded_object() {
    let p = param(json!({
        "name": "X-Tags",
        "in": "header",
        "style": "simple",
        "explode": true,
        "schema": {
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "string" }
            }
        }
    }));
    let input = RequestInput::new().with_header("x-tags", "a=1,b=2");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(found);
    assert_eq!(value, Some(json!({ "a": "1", "b": "2" })));
}

#[test]
fn test_cookie_form_primitive() {
    let p = param(json!({
        "name": "session",
        "in": "cookie",
        "schema": { "type": "string" }
    }));
    let input = RequestInput::new().with_cookie("session", "abc123");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(found);
    assert_eq!(value, Some(json!("abc123")));
}

#[test]
fn test_cookie_form_array() {
    let p = param(json!({
        "name": "ids",
        "in": "cookie",
        "style": "form",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_cookie("ids", "3,4,5");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!([3, 4, 5])));
}

#[test]
fn test_array_with_empty_element_decodes_to_null() {
    let p = param(json!({
        "name": "id",
        "in": "query",
        "style": "form",
        "explode": false,
        "schema": { "type": "array", "items": { "type": "integer" } }
    }));
    let input = RequestInput::new().with_query_string("id=1,,3");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(found);
    assert_eq!(value, None);
}

#[test]
fn test_missing_prefix_is_invalid_format() {
    for (style, raw) in [("label", "red,green"), ("matrix", "1,2")] {
        let p = param(json!({
            "name": "v",
            "in": "path",
            "style": style,
            "explode": false,
            "schema": { "type": "array", "items": { "type": "string" } }
        }));
        let input = RequestInput::new().with_path_param("v", raw);
        let err = decode(&p, &input).unwrap_err();
        assert!(
            err.to_string().contains("a value must be prefixed with"),
            "{style}: {err}"
        );
    }
}

#[test]
fn test_prefix_with_empty_body_is_null() {
    let p = param(json!({
        "name": "v",
        "in": "path",
        "style": "label",
        "schema": { "type": "string" }
    }));
    let input = RequestInput::new().with_path_param("v", ".");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(found);
    assert_eq!(value, None);
}

#[test]
fn test_illegal_style_location_combinations() {
    // (location, style, explode, schema type) cells outside the legality
    // table must all fail before any value is parsed.
    let cases = [
        ("path", "form", false, "string"),
        ("path", "deepObject", true, "object"),
        ("query", "simple", false, "string"),
        ("query", "label", false, "array"),
        ("query", "matrix", false, "array"),
        ("query", "spaceDelimited", true, "array"),
        ("query", "pipeDelimited", true, "array"),
        ("query", "deepObject", false, "object"),
        ("header", "form", false, "string"),
        ("header", "label", false, "array"),
        ("cookie", "simple", false, "string"),
        ("cookie", "form", true, "array"),
        ("cookie", "form", true, "object"),
    ];
    for (location, style, explode, type_name) in cases {
        let schema = match type_name {
            "array" => json!({ "type": "array", "items": { "type": "string" } }),
            "object" => json!({ "type": "object", "properties": {} }),
            _ => json!({ "type": "string" }),
        };
        let p = param(json!({
            "name": "v",
            "in": location,
            "style": style,
            "explode": explode,
            "schema": schema
        }));
        let input = RequestInput::new()
            .with_path_param("v", "x")
            .with_query_string("v=x")
            .with_header("v", "x")
            .with_cookie("v", "x");
        let err = decode(&p, &input).unwrap_err();
        assert!(
            matches!(err, DecodeError::InvalidSerialization { .. }),
            "{location}/{style}/{explode}: {err}"
        );
    }
}

#[test]
fn test_required_parameter_missing() {
    let p = param(json!({
        "name": "id",
        "in": "query",
        "required": true,
        "schema": { "type": "integer" }
    }));
    let input = RequestInput::new().with_query_string("other=1");
    let err = decode(&p, &input).unwrap_err();
    assert!(matches!(err, DecodeError::RequiredMissing { .. }));
    assert_eq!(err.to_string(), "parameter \"id\" is required, but missing");
}

#[test]
fn test_optional_parameter_missing_is_not_found() {
    let p = param(json!({
        "name": "id",
        "in": "query",
        "schema": { "type": "integer" }
    }));
    let input = RequestInput::new().with_query_string("other=1");
    let (value, found) = decode(&p, &input).unwrap();
    assert!(!found);
    assert_eq!(value, None);
}

#[test]
fn test_int32_overflow_surfaces_invalid_format() {
    let p = param(json!({
        "name": "n",
        "in": "query",
        "schema": { "type": "integer", "format": "int32" }
    }));
    let input = RequestInput::new().with_query_string("n=4294967296");
    let err = decode(&p, &input).unwrap_err();
    let parse = err.as_parse_error().expect("parse error");
    assert_eq!(parse.reason.as_deref(), Some("an invalid integer"));
}

#[test]
fn test_any_of_styled_parameter() {
    let p = param(json!({
        "name": "v",
        "in": "query",
        "schema": {
            "anyOf": [
                { "type": "integer" },
                { "type": "string" }
            ]
        }
    }));
    let input = RequestInput::new().with_query_string("v=hello");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!("hello")));
}

#[test]
fn test_all_of_styled_parameter_keeps_last_value() {
    let p = param(json!({
        "name": "v",
        "in": "query",
        "schema": {
            "allOf": [
                { "type": "string" },
                { "type": "integer" }
            ]
        }
    }));
    let input = RequestInput::new().with_query_string("v=7");
    let (value, _) = decode(&p, &input).unwrap();
    assert_eq!(value, Some(json!(7)));
}
