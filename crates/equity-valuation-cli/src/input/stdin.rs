use serde_json::{Deserializer, Value};
use std::io::{self, Read};

/// JSON piped on stdin, or `None` when stdin is a terminal or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    read_documents(io::stdin().lock())
}

/// `--input` file if given, else piped stdin, else `None`.
pub fn file_or_stdin(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => super::file::read_json_value(p).map(Some),
        None => read_stdin(),
    }
}

/// Parse one or more whitespace-separated JSON documents.
///
/// A single document is returned as is; several (for example
/// `cat ko.json pep.json | eqv compare`) are collected into an array.
pub fn read_documents(mut reader: impl Read) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;

    let mut documents = Deserializer::from_str(&buffer)
        .into_iter::<Value>()
        .enumerate()
        .map(|(i, doc)| doc.map_err(|e| format!("Failed to parse piped JSON document {}: {e}", i + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(documents = documents.len(), "read piped input");
    Ok(match documents.len() {
        0 => None,
        1 => documents.pop(),
        _ => Some(Value::Array(documents)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_input_is_none() {
        assert_eq!(read_documents("  \n\t".as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_single_document_passes_through() {
        let value = read_documents(r#" {"symbol": "KO", "currentPrice": 62} "#.as_bytes()).unwrap();
        assert_eq!(value, Some(json!({"symbol": "KO", "currentPrice": 62})));

        let value = read_documents("[1, 2]".as_bytes()).unwrap();
        assert_eq!(value, Some(json!([1, 2])));
    }

    #[test]
    fn test_concatenated_documents_become_an_array() {
        let piped = "{\"symbol\": \"KO\"}\n{\"symbol\": \"PEP\"}\n";
        let value = read_documents(piped.as_bytes()).unwrap();
        assert_eq!(value, Some(json!([{"symbol": "KO"}, {"symbol": "PEP"}])));
    }

    #[test]
    fn test_malformed_document_is_named() {
        let err = read_documents("{\"symbol\": \"KO\"} {oops".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("document 2"), "{err}");
    }
}
