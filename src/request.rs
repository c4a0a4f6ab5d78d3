use std::collections::HashMap;

use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use url::form_urlencoded;

/// Raw request surface consumed by the decoders.
///
/// Path parameters arrive pre-extracted by the caller's router; the query
/// string is a multi-map as produced by URL query parsing; headers keep the
/// canonical-cased multi-map semantics of [`http::HeaderMap`]; cookies are a
/// flat name-to-value map parsed from the `Cookie` header.
#[derive(Debug, Default, Clone)]
pub struct RequestInput {
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, Vec<String>>,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
}

impl RequestInput {
    pub fn new() -> Self {
        RequestInput::default()
    }

    /// Build the surface from a request target (path plus optional query
    /// string) and headers; cookies are parsed out of the `Cookie` header.
    pub fn from_parts(
        path_params: HashMap<String, String>,
        target: &str,
        headers: HeaderMap,
    ) -> Self {
        let query = parse_query_values(target);
        let cookies = parse_cookies(&headers);
        RequestInput {
            path_params,
            query,
            headers,
            cookies,
        }
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Parse a bare query string (no leading `?`) into the query multi-map,
    /// appending to any values already present.
    pub fn with_query_string(mut self, raw_query: &str) -> Self {
        for (name, value) in form_urlencoded::parse(raw_query.as_bytes()) {
            self.query
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }
}

/// Extract cookies from the `Cookie` header(s).
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let Some(name) = parts.next() else { continue };
            if name.is_empty() {
                continue;
            }
            let value = parts.next().unwrap_or("").trim();
            cookies.insert(name.trim().to_string(), value.to_string());
        }
    }
    cookies
}

/// Parse the query portion of a request target into a multi-map.
pub fn parse_query_values(target: &str) -> HashMap<String, Vec<String>> {
    let Some((_, query)) = target.split_once('?') else {
        return HashMap::new();
    };
    let mut values: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        values.entry(name.into_owned()).or_default().push(value.into_owned());
    }
    values
}
