use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures the engine reports to the caller. All of them leave the process
/// interactive; degenerate inputs (zero variance, empty selections, empty
/// documents) are results, not errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no {role} column selected")]
    NoColumnSelected { role: &'static str },

    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("column '{0}' has no parseable numeric values")]
    UnparseableColumn(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} files cannot be read as a {wanted}")]
    WrongSourceKind {
        format: &'static str,
        wanted: &'static str,
    },

    #[error("failed to read {path}: {message}")]
    Source { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mapping file: {0}")]
    Mapping(#[from] serde_json::Error),
}

impl EngineError {
    /// User-facing configuration problems: a bad selection or a table that
    /// lacks what the request needs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::NoColumnSelected { .. }
                | EngineError::MissingColumn(_)
                | EngineError::MissingSheet(_)
                | EngineError::UnparseableColumn(_)
        )
    }

    pub(crate) fn read_failure(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        EngineError::Source {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert!(EngineError::MissingColumn("Sales".into()).is_configuration());
        assert!(EngineError::NoColumnSelected { role: "numeric" }.is_configuration());
        assert!(!EngineError::UnsupportedFormat("exe".into()).is_configuration());
    }

    #[test]
    fn messages_name_the_offending_column() {
        let err = EngineError::UnparseableColumn("Revenue".into());
        assert_eq!(err.to_string(), "column 'Revenue' has no parseable numeric values");
    }
}
