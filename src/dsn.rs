//! Connection-string (DSN) parsing.
//!
//! A DSN has the shape `<target-path>[?key1=val1&key2=val2&...]`. The target
//! path is everything before the first `?` and is handed to the engine
//! verbatim. Query keys and values are percent-decoded; duplicate keys keep
//! their first occurrence so option application is deterministic.

use crate::error::DriverError;

/// A parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    raw: String,
    target: String,
    options: Vec<(String, String)>,
}

impl Dsn {
    /// Parse a raw connection string.
    ///
    /// # Errors
    /// Returns `DriverError::ConfigParse` for control characters in the
    /// string or malformed percent escapes in the query portion.
    pub fn parse(raw: &str) -> Result<Self, DriverError> {
        if let Some(c) = raw.chars().find(|c| c.is_ascii_control()) {
            return Err(DriverError::ConfigParse(format!(
                "control character {c:?} in connection string"
            )));
        }

        let (target, query) = match raw.split_once('?') {
            Some((target, query)) => (target, Some(query)),
            None => (raw, None),
        };

        let mut options = Vec::new();
        if let Some(query) = query {
            for segment in query.split('&') {
                if segment.is_empty() {
                    continue;
                }
                let (key, value) = match segment.split_once('=') {
                    Some((key, value)) => (key, value),
                    None => (segment, ""),
                };
                let key = percent_decode(key)?;
                if key.is_empty() {
                    continue;
                }
                // First occurrence wins; later duplicates are dropped.
                if options.iter().any(|(existing, _)| *existing == key) {
                    continue;
                }
                let value = percent_decode(value)?;
                options.push((key, value));
            }
        }

        Ok(Self {
            raw: raw.to_owned(),
            target: target.to_owned(),
            options,
        })
    }

    /// The portion before the first `?`, exactly as the caller wrote it.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Decoded query options in application order.
    #[must_use]
    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// The original connection string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn percent_decode(input: &str) -> Result<String, DriverError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'%' => {
                let hi = bytes.get(idx + 1).and_then(|b| hex_value(*b));
                let lo = bytes.get(idx + 2).and_then(|b| hex_value(*b));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        idx += 3;
                    }
                    _ => {
                        return Err(DriverError::ConfigParse(format!(
                            "malformed percent escape in {input:?}"
                        )));
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                idx += 1;
            }
            b => {
                out.push(b);
                idx += 1;
            }
        }
    }
    String::from_utf8(out)
        .map_err(|_| DriverError::ConfigParse(format!("invalid UTF-8 after decoding {input:?}")))
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_whole_string_without_query() {
        let dsn = Dsn::parse("path/to/data.db").unwrap();
        assert_eq!(dsn.target(), "path/to/data.db");
        assert!(dsn.options().is_empty());
    }

    #[test]
    fn target_stops_at_first_question_mark() {
        let dsn = Dsn::parse("mem.db?note=what%3F&x=1").unwrap();
        assert_eq!(dsn.target(), "mem.db");
        assert_eq!(
            dsn.options(),
            &[
                ("note".to_owned(), "what?".to_owned()),
                ("x".to_owned(), "1".to_owned())
            ]
        );
    }

    #[test]
    fn first_duplicate_key_wins() {
        let dsn = Dsn::parse("db?threads=4&threads=8").unwrap();
        assert_eq!(dsn.options(), &[("threads".to_owned(), "4".to_owned())]);
    }

    #[test]
    fn key_without_value_gets_empty_value() {
        let dsn = Dsn::parse("db?flag&threads=2").unwrap();
        assert_eq!(
            dsn.options(),
            &[
                ("flag".to_owned(), String::new()),
                ("threads".to_owned(), "2".to_owned())
            ]
        );
    }

    #[test]
    fn empty_segments_and_keys_are_skipped() {
        let dsn = Dsn::parse("db?&a=1&&=zzz&b=2").unwrap();
        assert_eq!(
            dsn.options(),
            &[
                ("a".to_owned(), "1".to_owned()),
                ("b".to_owned(), "2".to_owned())
            ]
        );
    }

    #[test]
    fn plus_decodes_to_space() {
        let dsn = Dsn::parse("db?msg=hello+world").unwrap();
        assert_eq!(dsn.options(), &[("msg".to_owned(), "hello world".to_owned())]);
    }

    #[test]
    fn malformed_percent_escape_is_a_parse_error() {
        let err = Dsn::parse("db?bad=%zz").unwrap_err();
        assert!(matches!(err, DriverError::ConfigParse(_)));
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = Dsn::parse("db\n?a=1").unwrap_err();
        assert!(matches!(err, DriverError::ConfigParse(_)));
    }

    #[test]
    fn target_is_not_percent_decoded() {
        let dsn = Dsn::parse("dir%20name/file.db?a=1").unwrap();
        assert_eq!(dsn.target(), "dir%20name/file.db");
    }
}
