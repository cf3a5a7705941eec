//! Row value representation and target-dialect literal serialization.
//!
//! Values are a closed tagged union so the serializer is total by exhaustive
//! match: anything the source driver cannot express as one of these variants
//! is rejected at ingestion with `UnsupportedValueType` instead of being
//! coerced to text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A single cell value read from the source database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit floating point.
    Float(f64),

    /// Binary data (BLOB, RAW).
    Bytes(Vec<u8>),

    /// Text data.
    Text(String),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render this value as a PostgreSQL literal for use in a statement.
    ///
    /// - NULL is the bare `NULL` keyword, whatever the column type.
    /// - Integers and floats are unquoted decimal text.
    /// - Binary data is base64 text in single quotes.
    /// - Text is single-quoted with embedded quotes doubled. No other
    ///   character is rewritten; the literal parses back to the input
    ///   exactly.
    #[must_use]
    pub fn pg_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => v.to_string(),
            SqlValue::Bytes(v) => format!("'{}'", BASE64.encode(v)),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }

    /// Interpret this value as an integer, parsing numeric text.
    ///
    /// Catalog attribute values (lengths, positions, sequence bounds) arrive
    /// as `Int` from typed drivers and as `Text` from text-buffer drivers;
    /// both must resolve the same way.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            SqlValue::Text(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret this value as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse a PostgreSQL single-quoted literal back to its text content.
    fn parse_pg_string_literal(lit: &str) -> String {
        assert!(lit.starts_with('\'') && lit.ends_with('\''), "not quoted: {lit}");
        lit[1..lit.len() - 1].replace("''", "'")
    }

    #[test]
    fn test_null_literal_is_constant() {
        assert_eq!(SqlValue::Null.pg_literal(), "NULL");
    }

    #[test]
    fn test_integer_literal_is_exact_and_unquoted() {
        assert_eq!(SqlValue::Int(0).pg_literal(), "0");
        assert_eq!(SqlValue::Int(-42).pg_literal(), "-42");
        assert_eq!(
            SqlValue::Int(i64::MAX).pg_literal(),
            "9223372036854775807"
        );
        assert_eq!(
            SqlValue::Int(i64::MIN).pg_literal().parse::<i64>().unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn test_float_literal_round_trips() {
        let lit = SqlValue::Float(1.5).pg_literal();
        assert_eq!(lit.parse::<f64>().unwrap(), 1.5);
        assert!(!lit.contains('\''));
    }

    #[test]
    fn test_text_quote_doubling_round_trips() {
        for text in ["Eng", "O'Brien", "", "''", "a'b'c", "it's 'quoted'"] {
            let lit = SqlValue::Text(text.to_string()).pg_literal();
            assert_eq!(parse_pg_string_literal(&lit), text, "literal {lit}");
        }
    }

    #[test]
    fn test_text_preserves_colons_verbatim() {
        let lit = SqlValue::Text("10:30:00 ratio 2:1".to_string()).pg_literal();
        assert_eq!(parse_pg_string_literal(&lit), "10:30:00 ratio 2:1");
    }

    #[test]
    fn test_bytes_are_base64_quoted() {
        let lit = SqlValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]).pg_literal();
        assert_eq!(lit, "'3q2+7w=='");
    }

    #[test]
    fn test_as_i64_accepts_numeric_text() {
        assert_eq!(SqlValue::Int(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Text(" 7 ".into()).as_i64(), Some(7));
        assert_eq!(SqlValue::Float(7.0).as_i64(), Some(7));
        assert_eq!(SqlValue::Float(7.5).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }
}
