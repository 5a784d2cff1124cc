use std::fmt;

/// Category of a row access error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Positional index outside `[0, len)`.
    IndexOutOfRange,
    /// Name absent from the column (or field) definitions.
    NameNotFound,
    /// Requested host type or codec cannot handle the wire type,
    /// or the bytes are not a valid encoding of it.
    InvalidType,
    /// Operation not valid for this row or result shape.
    IllegalState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::IndexOutOfRange => f.write_str("index out of range"),
            ErrorKind::NameNotFound => f.write_str("name not found"),
            ErrorKind::InvalidType => f.write_str("invalid type"),
            ErrorKind::IllegalState => f.write_str("illegal state"),
        }
    }
}

/// Error returned by every accessor, codec and registry lookup.
///
/// None of these are transient: they describe a mismatch between what the
/// caller asked for and the shape of the result, so they are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("index {index} is out of range for {len} columns")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{0}' is not a defined column")]
    NameNotFound(String),

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl RowError {
    pub fn invalid_type(msg: impl Into<String>) -> Self {
        RowError::InvalidType(msg.into())
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        RowError::IllegalState(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RowError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            RowError::NameNotFound(_) => ErrorKind::NameNotFound,
            RowError::InvalidType(_) => ErrorKind::InvalidType,
            RowError::IllegalState(_) => ErrorKind::IllegalState,
        }
    }

    /// Add context to the error, preserving its kind.
    ///
    /// Only message-carrying variants are rewritten: `"context: message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            RowError::InvalidType(msg) => RowError::InvalidType(format!("{ctx}: {msg}")),
            RowError::IllegalState(msg) => RowError::IllegalState(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

impl From<std::str::Utf8Error> for RowError {
    fn from(e: std::str::Utf8Error) -> Self {
        RowError::InvalidType(format!("invalid UTF-8 text: {e}"))
    }
}
