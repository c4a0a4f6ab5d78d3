//! Read-only views over JSON Schema fragments.
//!
//! Schemas enter the decoding core as `serde_json::Value` trees extracted
//! from an OpenAPI document by the caller. [`SchemaRef`] wraps a borrowed
//! fragment and exposes the handful of attributes the decoders consult:
//! the type set, `format`, `pattern`, composition keywords, `properties`,
//! `items` and `additionalProperties`.

use std::fmt;

use serde_json::Value;

/// A primitive or structural JSON Schema type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of type names a schema declares.
///
/// Both the `"type": "string"` and the `"type": ["string", "null"]`
/// spellings are accepted. Unknown names are kept verbatim so that the
/// primitive parser can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet<'s>(Vec<&'s str>);

impl<'s> TypeSet<'s> {
    /// True when the set names exactly this one type.
    pub fn is(&self, t: SchemaType) -> bool {
        self.0.len() == 1 && self.0[0] == t.as_str()
    }

    /// True when the set contains this type.
    pub fn permits(&self, t: SchemaType) -> bool {
        self.0.iter().any(|name| *name == t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[&'s str] {
        &self.0
    }
}

impl fmt::Display for TypeSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

static EMPTY_SCHEMA: Value = Value::Null;

/// Borrowed view of one schema node.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRef<'s> {
    raw: &'s Value,
}

impl<'s> SchemaRef<'s> {
    pub fn new(raw: &'s Value) -> Self {
        SchemaRef { raw }
    }

    /// A schema with no constraints at all. Used where a sub-schema slot
    /// (such as `items`) is absent.
    pub fn empty() -> SchemaRef<'s> {
        SchemaRef { raw: &EMPTY_SCHEMA }
    }

    pub fn raw(self) -> &'s Value {
        self.raw
    }

    fn field(self, name: &str) -> Option<&'s Value> {
        self.raw.get(name)
    }

    pub fn types(self) -> TypeSet<'s> {
        match self.field("type") {
            Some(Value::String(name)) => TypeSet(vec![name.as_str()]),
            Some(Value::Array(names)) => {
                TypeSet(names.iter().filter_map(Value::as_str).collect())
            }
            _ => TypeSet::default(),
        }
    }

    pub fn format(self) -> Option<&'s str> {
        self.field("format").and_then(Value::as_str)
    }

    pub fn pattern(self) -> Option<&'s str> {
        self.field("pattern").and_then(Value::as_str)
    }

    fn ref_list(self, keyword: &str) -> Vec<SchemaRef<'s>> {
        match self.field(keyword).and_then(Value::as_array) {
            Some(members) => members.iter().map(SchemaRef::new).collect(),
            None => Vec::new(),
        }
    }

    pub fn all_of(self) -> Vec<SchemaRef<'s>> {
        self.ref_list("allOf")
    }

    pub fn any_of(self) -> Vec<SchemaRef<'s>> {
        self.ref_list("anyOf")
    }

    pub fn one_of(self) -> Vec<SchemaRef<'s>> {
        self.ref_list("oneOf")
    }

    pub fn not_schema(self) -> Option<SchemaRef<'s>> {
        self.field("not").map(SchemaRef::new)
    }

    /// Declared properties, in deterministic (key-sorted) order.
    pub fn properties(self) -> impl Iterator<Item = (&'s str, SchemaRef<'s>)> {
        self.field("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(name, schema)| (name.as_str(), SchemaRef::new(schema)))
    }

    pub fn property(self, name: &str) -> Option<SchemaRef<'s>> {
        self.field("properties")?.get(name).map(SchemaRef::new)
    }

    pub fn items(self) -> Option<SchemaRef<'s>> {
        self.field("items").map(SchemaRef::new)
    }

    pub fn items_or_empty(self) -> SchemaRef<'s> {
        self.items().unwrap_or_else(SchemaRef::empty)
    }

    pub fn additional_properties(self) -> AdditionalProperties<'s> {
        match self.field("additionalProperties") {
            None => AdditionalProperties::Unset,
            Some(Value::Bool(flag)) => AdditionalProperties::Flag(*flag),
            Some(schema) => AdditionalProperties::Schema(SchemaRef::new(schema)),
        }
    }
}

/// The `additionalProperties` keyword: absent, a boolean flag, or a schema.
#[derive(Debug, Clone, Copy)]
pub enum AdditionalProperties<'s> {
    Unset,
    Flag(bool),
    Schema(SchemaRef<'s>),
}

impl<'s> AdditionalProperties<'s> {
    pub fn schema(self) -> Option<SchemaRef<'s>> {
        match self {
            AdditionalProperties::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_set_single_and_list() {
        let single = json!({ "type": "integer" });
        let schema = SchemaRef::new(&single);
        assert!(schema.types().is(SchemaType::Integer));
        assert!(schema.types().permits(SchemaType::Integer));
        assert!(!schema.types().is(SchemaType::String));

        let list = json!({ "type": ["string", "null"] });
        let schema = SchemaRef::new(&list);
        assert!(!schema.types().is(SchemaType::String));
        assert!(schema.types().permits(SchemaType::String));
        assert!(schema.types().permits(SchemaType::Null));
    }

    #[test]
    fn untyped_schema_has_empty_set() {
        let raw = json!({ "pattern": "^a+$" });
        let schema = SchemaRef::new(&raw);
        assert!(schema.types().is_empty());
        assert_eq!(schema.pattern(), Some("^a+$"));
    }

    #[test]
    fn additional_properties_shapes() {
        let flag = json!({ "additionalProperties": false });
        assert!(matches!(
            SchemaRef::new(&flag).additional_properties(),
            AdditionalProperties::Flag(false)
        ));

        let nested = json!({ "additionalProperties": { "type": "string" } });
        let ap = SchemaRef::new(&nested).additional_properties();
        assert!(ap.schema().is_some());

        let unset = json!({});
        assert!(matches!(
            SchemaRef::new(&unset).additional_properties(),
            AdditionalProperties::Unset
        ));
    }
}
