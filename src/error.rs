use std::error::Error as StdError;
use std::fmt;
use std::io;

use serde_json::Value;

use crate::param::{SerializationMethod, Style};

/// Kind of a [`ParseError`].
///
/// The kind simplifies comparison of errors without inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An untyped decoding failure (schema or structural mismatch).
    Other,
    /// The value's format is not supported (unknown media type, `not` schemas).
    UnsupportedFormat,
    /// The raw input does not conform to the shape its serialization requires.
    InvalidFormat,
}

/// One step of the path from the root value to a failing leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object property name.
    Prop(String),
    /// An array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Prop(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Structured error raised while decoding a parameter or body.
///
/// Carries the offending value, a human-readable reason, an optional cause and
/// a path trail from the root value down to the failing leaf. Path segments
/// are prepended as the error bubbles up through arrays (by index) and
/// objects (by property name), so the rendered trail reads root to leaf:
///
/// ```text
/// path a.b.0: value "x": an invalid integer: invalid digit found in string
/// ```
#[derive(Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub value: Option<Value>,
    pub reason: Option<String>,
    cause: Option<Box<dyn StdError + Send + Sync>>,
    path: Vec<PathSegment>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind) -> Self {
        ParseError {
            kind,
            value: None,
            reason: None,
            cause: None,
            path: Vec::new(),
        }
    }

    pub fn invalid_format(value: impl Into<Value>, reason: impl Into<String>) -> Self {
        ParseError::new(ParseErrorKind::InvalidFormat)
            .with_value(value)
            .with_reason(reason)
    }

    pub fn unsupported_format(reason: impl Into<String>) -> Self {
        ParseError::new(ParseErrorKind::UnsupportedFormat).with_reason(reason)
    }

    pub fn other(reason: impl Into<String>) -> Self {
        ParseError::new(ParseErrorKind::Other).with_reason(reason)
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.cause = Some(cause.into());
        self
    }

    pub fn at_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Wrap an array item's error, recording the item index.
    pub fn wrap_index(index: usize, cause: ParseError) -> Self {
        ParseError::new(ParseErrorKind::Other)
            .with_cause(cause)
            .at_path(vec![PathSegment::Index(index)])
    }

    /// Wrap a property's error, recording the property name.
    pub fn wrap_prop(name: impl Into<String>, cause: ParseError) -> Self {
        ParseError::new(ParseErrorKind::Other)
            .with_cause(cause)
            .at_path(vec![PathSegment::Prop(name.into())])
    }

    /// Wrap a nested property's error, recording the full key path.
    pub fn wrap_props(keys: &[&str], cause: ParseError) -> Self {
        ParseError::new(ParseErrorKind::Other)
            .with_cause(cause)
            .at_path(keys.iter().map(|k| PathSegment::Prop((*k).to_string())).collect())
    }

    /// Full path to the failing leaf, own segments first, then any segments
    /// recorded by nested [`ParseError`] causes.
    pub fn path(&self) -> Vec<PathSegment> {
        let mut path = self.path.clone();
        if let Some(cause) = &self.cause {
            if let Some(nested) = cause.downcast_ref::<ParseError>() {
                path.extend(nested.path());
            }
        }
        path
    }

    pub fn cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }

    /// Innermost cause that is not itself a [`ParseError`].
    pub fn root_cause(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.cause {
            Some(cause) => match cause.downcast_ref::<ParseError>() {
                Some(nested) => nested.root_cause(),
                None => Some(cause.as_ref() as &(dyn StdError + 'static)),
            },
            None => None,
        }
    }

    fn push_inner(&self, parts: &mut Vec<String>) {
        if let Some(value) = &self.value {
            parts.push(format!("value {value}"));
        }
        if let Some(reason) = &self.reason {
            parts.push(reason.clone());
        }
        if let Some(cause) = &self.cause {
            match cause.downcast_ref::<ParseError>() {
                Some(nested) => nested.push_inner(parts),
                None => parts.push(cause.to_string()),
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let path = self.path();
        if !path.is_empty() {
            let trail: Vec<String> = path.iter().map(|s| s.to_string()).collect();
            parts.push(format!("path {}", trail.join(".")));
        }
        self.push_inner(&mut parts);
        f.write_str(&parts.join(": "))
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Top-level error returned by the decoding entry points.
#[derive(Debug)]
pub enum DecodeError {
    /// Structured decoding failure with a path trail.
    Parse(ParseError),
    /// The (style, explode) pair is not defined for the parameter's location.
    InvalidSerialization { style: Style, explode: bool },
    /// A required parameter was absent from the request surface.
    RequiredMissing { name: String },
    /// Every alternative of a composite schema failed to produce a value.
    Alternatives {
        keyword: &'static str,
        name: String,
    },
    /// A content-based parameter could not be decoded.
    ContentParameter { name: String, reason: String },
    /// The body's schema shape is outside what the selected decoder handles.
    UnsupportedSchema { detail: String },
    /// Two schema members decoded the same property to different values.
    ConflictingProperty { name: String },
    /// Reading the input stream failed.
    Io(io::Error),
    /// Structural or schema mismatch outside the cases above.
    Other(String),
}

impl DecodeError {
    pub(crate) fn invalid_serialization(sm: &SerializationMethod) -> Self {
        DecodeError::InvalidSerialization {
            style: sm.style,
            explode: sm.explode,
        }
    }

    /// The inner [`ParseError`], if this error carries one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            DecodeError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Parse(err) => err.fmt(f),
            DecodeError::InvalidSerialization { style, explode } => write!(
                f,
                "invalid serialization method: style={style:?}, explode={explode}",
                style = style.as_str(),
            ),
            DecodeError::RequiredMissing { name } => {
                write!(f, "parameter {name:?} is required, but missing")
            }
            DecodeError::Alternatives { keyword, name } => match *keyword {
                "oneOf" => write!(f, "decoding oneOf failed: {name:?} is required"),
                _ => write!(f, "decoding {keyword} for parameter {name:?} failed"),
            },
            DecodeError::ContentParameter { name, reason } => {
                write!(f, "parameter {name:?}: {reason}")
            }
            DecodeError::UnsupportedSchema { detail } => {
                write!(f, "unsupported schema of {detail}")
            }
            DecodeError::ConflictingProperty { name } => {
                write!(f, "conflicting values for property {name:?}")
            }
            DecodeError::Io(err) => write!(f, "reading body: {err}"),
            DecodeError::Other(msg) => f.write_str(msg),
        }
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DecodeError::Parse(err) => Some(err),
            DecodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for DecodeError {
    fn from(err: ParseError) -> Self {
        DecodeError::Parse(err)
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Io(err)
    }
}
