//! Identifier validation and quoting for generated SQL.
//!
//! DDL identifiers cannot be passed as statement parameters, so every schema,
//! table, column, constraint, index and sequence name read from the source
//! catalog is validated against a restrictive allow-list before it is
//! interpolated into a statement.

use crate::error::{MigrateError, Result};

/// Maximum identifier length (PostgreSQL truncates at 63 bytes; Oracle
/// allows 128 since 12.2 — validate at the larger bound and let the target
/// fold).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier against the allow-list.
///
/// Accepts a leading ASCII letter or underscore followed by ASCII
/// alphanumerics, `_`, `$` or `#` (the Oracle identifier charset). Everything
/// else — quotes, whitespace, semicolons, null bytes — is rejected before it
/// can reach a statement.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(MigrateError::Config(format!(
            "Identifier must start with a letter or underscore: {:?}",
            name
        )));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#')))
    {
        return Err(MigrateError::Config(format!(
            "Identifier contains disallowed character {:?}: {:?}",
            bad, name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier after validating and lower-folding it.
///
/// Source catalogs hand back upper-cased names; the target side stores
/// everything lower-cased, so `EMPLOYEES` becomes `"employees"`.
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.to_lowercase()))
}

/// Qualify a PostgreSQL table name with schema.
///
/// Returns `"schema"."table"` with both parts validated and lower-folded.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg(schema)?, quote_pg(table)?))
}

/// Validate and upper-fold a schema name for Oracle catalog queries.
///
/// Oracle case-folds unquoted identifiers to upper case; catalog views store
/// the folded form, so lookups must match it.
pub fn fold_oracle(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(name.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_allows_oracle_charset() {
        assert!(validate_identifier("EMPLOYEES").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("_staging").is_ok());
        assert!(validate_identifier("ORDER$LOG").is_ok());
        assert!(validate_identifier("TMP#1").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection_shapes() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier("a;DROP TABLE x").is_err());
        assert!(validate_identifier("a'b").is_err());
        assert!(validate_identifier("a\"b").is_err());
        assert!(validate_identifier("a\0b").is_err());
        assert!(validate_identifier(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_identifier_accepts_max_length() {
        assert!(validate_identifier(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_quote_pg_lower_folds() {
        assert_eq!(quote_pg("EMPLOYEES").unwrap(), "\"employees\"");
        assert_eq!(quote_pg("dept_id").unwrap(), "\"dept_id\"");
    }

    #[test]
    fn test_qualify_pg() {
        assert_eq!(
            qualify_pg("HR", "EMPLOYEES").unwrap(),
            "\"hr\".\"employees\""
        );
    }

    #[test]
    fn test_fold_oracle_upper_folds() {
        assert_eq!(fold_oracle("hr").unwrap(), "HR");
        assert_eq!(fold_oracle("HR").unwrap(), "HR");
    }

    #[test]
    fn test_qualify_rejects_invalid_parts() {
        assert!(qualify_pg("", "users").is_err());
        assert!(qualify_pg("public", "users; --").is_err());
    }
}
