//! Error types for the minipg database engine.
//!
//! All public APIs return `MinipgResult<T>`; no panics in library code.

use thiserror::Error;

/// Unified error type for all minipg operations.
#[derive(Debug, Error)]
pub enum MinipgError {
    /// CREATE TABLE with a name already present in the catalog
    #[error("table '{0}' already existed")]
    TableExisted(String),

    /// Statement refers to a table the catalog does not know
    #[error("table '{0}' not existed")]
    TableNotExisted(String),

    /// INSERT carries no rows, or a row's arity does not match the schema
    #[error("inserted values are not complete")]
    ValuesIncomplete,

    /// Projection, WHERE, or INSERT column list names a column outside the schema
    #[error("table column names are not matched")]
    ColumnNamesNotMatched,

    /// No index exists for the requested column
    #[error("index not existed on table '{table}', column '{column}'")]
    IndexNotExisted { table: String, column: String },

    /// Index lookup found no row for the key
    #[error("table row not existed")]
    RowNotExisted,

    /// Row decode could not convert a binary field to an integer
    #[error("convert int field failed: {0}")]
    ConvertIntFailed(String),

    /// Row decode could not convert a binary field to text
    #[error("convert text field failed: {0}")]
    ConvertTextFailed(String),

    /// Row decode could not read a whole record
    #[error("convert record failed: {0}")]
    ConvertRecordFailed(String),

    /// Query string could not be parsed or lowers to an unsupported shape
    #[error("query syntax invalid: {message}\nquery: {query}")]
    QuerySyntaxInvalid { message: String, query: String },

    /// WHERE clause names a column without a value, or a value without a column
    #[error("query syntax invalid: where clause is incomplete")]
    QuerySyntaxWhereIncomplete,

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for all minipg operations.
pub type MinipgResult<T> = Result<T, MinipgError>;

impl From<serde_json::Error> for MinipgError {
    fn from(err: serde_json::Error) -> Self {
        MinipgError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_table_existed() {
        let err = MinipgError::TableExisted("users".to_string());
        assert_eq!(err.to_string(), "table 'users' already existed");
    }

    #[test]
    fn error_display_index_not_existed() {
        let err = MinipgError::IndexNotExisted {
            table: "users".to_string(),
            column: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "index not existed on table 'users', column 'name'"
        );
    }

    #[test]
    fn error_display_query_syntax() {
        let err = MinipgError::QuerySyntaxInvalid {
            message: "unexpected token".to_string(),
            query: "SELECT * FORM users".to_string(),
        };
        assert!(err.to_string().contains("query syntax invalid"));
        assert!(err.to_string().contains("FORM users"));
    }

    #[test]
    fn minipg_result_err() {
        let result: MinipgResult<i32> = Err(MinipgError::RowNotExisted);
        assert!(result.is_err());
    }
}
