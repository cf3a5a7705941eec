//! Type mapping between Oracle and PostgreSQL.

use crate::error::{MigrateError, Result};

/// Map an Oracle data type to PostgreSQL.
///
/// `char_length` is required for variable-length character types and ignored
/// elsewhere. Unrecognized type names pass through unchanged: the table is
/// intentionally non-exhaustive, and an unmapped type is a signal to extend
/// it rather than a fatal defect.
pub fn oracle_to_postgres(data_type: &str, char_length: Option<u32>) -> Result<String> {
    match data_type.to_uppercase().as_str() {
        // Numerics. NUMBER keeps arbitrary precision on the target.
        "NUMBER" => Ok("numeric".to_string()),
        "FLOAT" | "BINARY_DOUBLE" => Ok("double precision".to_string()),
        "BINARY_FLOAT" => Ok("real".to_string()),

        // Large objects
        "BLOB" => Ok("bytea".to_string()),
        "CLOB" | "NCLOB" | "LONG" => Ok("text".to_string()),

        // Raw binary
        "RAW" | "LONG RAW" => Ok("bytea".to_string()),

        // Variable-length character types need a declared length
        "VARCHAR2" | "NVARCHAR2" => match char_length {
            Some(n) if n > 0 => Ok(format!("varchar({})", n)),
            _ => Err(MigrateError::invalid_metadata(
                data_type.to_string(),
                "variable-length character type requires a positive char_length",
            )),
        },

        // Oracle DATE carries a time of day
        "DATE" => Ok("timestamp".to_string()),

        // Escape hatch: pass unrecognized types through unchanged
        _ => Ok(data_type.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_mappings() {
        assert_eq!(oracle_to_postgres("NUMBER", None).unwrap(), "numeric");
        assert_eq!(oracle_to_postgres("BLOB", None).unwrap(), "bytea");
        assert_eq!(oracle_to_postgres("CLOB", None).unwrap(), "text");
        assert_eq!(
            oracle_to_postgres("VARCHAR2", Some(50)).unwrap(),
            "varchar(50)"
        );
    }

    #[test]
    fn test_mapping_is_case_insensitive() {
        assert_eq!(oracle_to_postgres("number", None).unwrap(), "numeric");
        assert_eq!(
            oracle_to_postgres("Varchar2", Some(30)).unwrap(),
            "varchar(30)"
        );
    }

    #[test]
    fn test_varchar_requires_positive_length() {
        assert!(matches!(
            oracle_to_postgres("VARCHAR2", None),
            Err(MigrateError::InvalidMetadata { .. })
        ));
        assert!(matches!(
            oracle_to_postgres("VARCHAR2", Some(0)),
            Err(MigrateError::InvalidMetadata { .. })
        ));
        assert!(matches!(
            oracle_to_postgres("NVARCHAR2", None),
            Err(MigrateError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_supplemental_mappings() {
        assert_eq!(oracle_to_postgres("RAW", Some(16)).unwrap(), "bytea");
        assert_eq!(oracle_to_postgres("LONG RAW", None).unwrap(), "bytea");
        assert_eq!(oracle_to_postgres("NCLOB", None).unwrap(), "text");
        assert_eq!(oracle_to_postgres("LONG", None).unwrap(), "text");
        assert_eq!(oracle_to_postgres("BINARY_FLOAT", None).unwrap(), "real");
        assert_eq!(
            oracle_to_postgres("BINARY_DOUBLE", None).unwrap(),
            "double precision"
        );
        assert_eq!(
            oracle_to_postgres("FLOAT", None).unwrap(),
            "double precision"
        );
        assert_eq!(oracle_to_postgres("DATE", None).unwrap(), "timestamp");
        assert_eq!(
            oracle_to_postgres("NVARCHAR2", Some(100)).unwrap(),
            "varchar(100)"
        );
    }

    #[test]
    fn test_unrecognized_types_pass_through() {
        assert_eq!(
            oracle_to_postgres("TIMESTAMP(6)", None).unwrap(),
            "TIMESTAMP(6)"
        );
        assert_eq!(oracle_to_postgres("XMLTYPE", None).unwrap(), "XMLTYPE");
        assert_eq!(
            oracle_to_postgres("SDO_GEOMETRY", Some(10)).unwrap(),
            "SDO_GEOMETRY"
        );
    }
}
