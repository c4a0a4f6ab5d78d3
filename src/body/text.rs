use std::io::{Cursor, Read};

use http::header::HeaderMap;
use serde_json::Value;

use crate::body::EncodingFn;
use crate::error::{DecodeError, ParseError, ParseErrorKind};
use crate::schema::SchemaRef;

/// Decode a `text/plain` body to a string.
pub fn plain_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    let mut data = Vec::new();
    body.read_to_end(&mut data)
        .map_err(|err| ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err))?;
    Ok(Value::from(String::from_utf8_lossy(&data).into_owned()))
}

/// Decode a raw octet stream to a string.
pub fn file_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    let mut data = Vec::new();
    body.read_to_end(&mut data)?;
    Ok(Value::from(String::from_utf8_lossy(&data).into_owned()))
}

/// Decode a zip body by concatenating its entries' contents into one
/// string.
pub fn zip_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    let mut data = Vec::new();
    body.read_to_end(&mut data)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|err| ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err))?;

    let mut content = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err))?;
        entry.read_to_end(&mut content)?;
    }
    Ok(Value::from(String::from_utf8_lossy(&content).into_owned()))
}

/// Decode a csv body to a string, re-joining fields with commas and rows
/// with newlines.
pub fn csv_body_decoder(
    body: &mut dyn Read,
    _headers: &HeaderMap,
    _schema: SchemaRef<'_>,
    _enc_fn: Option<&EncodingFn>,
) -> Result<Value, DecodeError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(body);
    let mut content = String::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| ParseError::new(ParseErrorKind::InvalidFormat).with_cause(err))?;
        content.push_str(&record.iter().collect::<Vec<_>>().join(","));
        content.push('\n');
    }
    Ok(Value::from(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_reads_the_whole_stream() {
        let schema = json!({});
        let value = plain_body_decoder(
            &mut "hello world".as_bytes(),
            &HeaderMap::new(),
            SchemaRef::new(&schema),
            None,
        )
        .unwrap();
        assert_eq!(value, json!("hello world"));
    }

    #[test]
    fn csv_rejoins_fields_and_rows() {
        let schema = json!({});
        let input = "a,b,c\nd,e,f\n";
        let value = csv_body_decoder(
            &mut input.as_bytes(),
            &HeaderMap::new(),
            SchemaRef::new(&schema),
            None,
        )
        .unwrap();
        assert_eq!(value, json!("a,b,c\nd,e,f\n"));
    }

    #[test]
    fn zip_concatenates_entry_contents() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut buf = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("a.txt", options.clone()).unwrap();
        writer.write_all(b"alpha ").unwrap();
        writer.start_file("b.txt", options).unwrap();
        writer.write_all(b"beta").unwrap();
        writer.finish().unwrap();
        let bytes = buf.into_inner();

        let schema = json!({});
        let value = zip_body_decoder(
            &mut bytes.as_slice(),
            &HeaderMap::new(),
            SchemaRef::new(&schema),
            None,
        )
        .unwrap();
        assert_eq!(value, json!("alpha beta"));
    }

    #[test]
    fn corrupt_zip_is_invalid_format() {
        let schema = json!({});
        let err = zip_body_decoder(
            &mut &b"not a zip"[..],
            &HeaderMap::new(),
            SchemaRef::new(&schema),
            None,
        )
        .unwrap_err();
        let parse = err.as_parse_error().expect("parse error");
        assert_eq!(parse.kind, ParseErrorKind::InvalidFormat);
    }
}
