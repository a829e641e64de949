use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Cannot coerce value for property '{property}' in row {row}: {reason}")]
    TypeCoercion {
        property: String,
        row: usize,
        reason: String,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// Attaches the row index to a coercion error raised while decoding a
    /// single row. Other variants pass through untouched.
    pub fn at_row(self, row: usize) -> Self {
        match self {
            Self::TypeCoercion {
                property, reason, ..
            } => Self::TypeCoercion {
                property,
                row,
                reason,
            },
            other => other,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for FetchError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
