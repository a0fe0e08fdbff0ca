//! Materialized partitions and the `col1=val1/col2=val2` name codec.
//!
//! Keys and values are escaped the way Hive escapes path components, so a
//! value containing `/` or `=` still round-trips through a partition name.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A partition reconstructed from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub database_name: String,
    pub table_name: String,
    /// Column values in partition declaration order.
    pub values: Vec<(String, String)>,
    pub name: String,
    pub location: String,
}

impl Partition {
    /// Value of one column, if present.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\u{01}'..='\u{1F}'
            | '\u{7F}'
            | '"'
            | '#'
            | '%'
            | '\''
            | '*'
            | '/'
            | ':'
            | '='
            | '?'
            | '\\'
            | '{'
            | '['
            | ']'
            | '^'
    )
}

/// Escape a path component, encoding unsafe ASCII as `%XX`.
pub fn escape_path_name(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if needs_escape(c) {
            // infallible for String
            let _ = write!(escaped, "%{:02X}", c as u32);
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse of [`escape_path_name`]. A `%` not followed by two hex digits is
/// kept literally.
pub fn unescape_path_name(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out = String::with_capacity(escaped.len());
    let mut i = 0;
    while i < escaped.len() {
        if bytes[i] == b'%' {
            let code = escaped
                .get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(code) = code.filter(u8::is_ascii) {
                out.push(char::from(code));
                i += 3;
                continue;
            }
        }
        // step over one whole char so multi-byte text stays intact
        let ch_len = escaped[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&escaped[i..i + ch_len]);
        i += ch_len;
    }
    out
}

/// Compose `col1=val1/col2=val2/...`. Zero columns give the empty name.
pub fn make_partition_name<K: AsRef<str>, V: AsRef<str>>(values: &[(K, V)]) -> String {
    values
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                escape_path_name(k.as_ref()),
                escape_path_name(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a partition name into unescaped `(column, value)` pairs.
///
/// Returns the reason on failure.
pub fn parse_partition_name(name: &str) -> Result<Vec<(String, String)>, String> {
    if name.is_empty() {
        return Ok(Vec::new());
    }
    name.split('/')
        .map(|segment| {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| format!("segment '{}' is not of the form column=value", segment))?;
            if key.is_empty() {
                return Err(format!("segment '{}' has an empty column name", segment));
            }
            Ok((unescape_path_name(key), unescape_path_name(value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_parse_name() {
        let name = make_partition_name(&[("region", "us-east"), ("dt", "2020-01-01")]);
        assert_eq!(name, "region=us-east/dt=2020-01-01");
        assert_eq!(
            parse_partition_name(&name).unwrap(),
            vec![
                ("region".to_string(), "us-east".to_string()),
                ("dt".to_string(), "2020-01-01".to_string())
            ]
        );
    }

    #[test]
    fn test_zero_columns_is_empty_name() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(make_partition_name(&empty), "");
        assert!(parse_partition_name("").unwrap().is_empty());
    }

    #[test]
    fn test_escaping_protects_separators() {
        let name = make_partition_name(&[("path", "a/b=c"), ("hour", "10:00")]);
        assert_eq!(name, "path=a%2Fb%3Dc/hour=10%3A00");
        let parsed = parse_partition_name(&name).unwrap();
        assert_eq!(parsed[0].1, "a/b=c");
        assert_eq!(parsed[1].1, "10:00");
    }

    #[test]
    fn test_unescape_keeps_stray_percent_and_unicode() {
        assert_eq!(unescape_path_name("100%"), "100%");
        assert_eq!(unescape_path_name("%zz"), "%zz");
        assert_eq!(unescape_path_name("caf\u{e9}%2F"), "caf\u{e9}/");
    }

    #[test]
    fn test_parse_rejects_malformed_segments() {
        assert!(parse_partition_name("region").is_err());
        assert!(parse_partition_name("=x").is_err());
        assert!(parse_partition_name("a=1//b=2").is_err());
    }

    #[test]
    fn test_partition_value_lookup() {
        let partition = Partition {
            database_name: "db".to_string(),
            table_name: "t".to_string(),
            values: vec![("a".to_string(), "1".to_string())],
            name: "a=1".to_string(),
            location: "s3://b/t/a=1".to_string(),
        };
        assert_eq!(partition.value("a"), Some("1"));
        assert_eq!(partition.value("b"), None);
    }
}
