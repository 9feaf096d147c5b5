use std::fmt;
use thiserror::Error;

/// Parse failure at a specific cursor position in the token stream.
///
/// Tokens carry no line information, so the position and the rendered
/// context window are the only way to locate the offending input.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    /// The literal the parser was looking for.
    pub expected: String,
    /// The token actually found, `None` at end of input.
    pub found: Option<String>,
    /// Index of the cursor in the token sequence.
    pub position: usize,
    /// A few tokens around the cursor, the offending one marked `>>> <<<`.
    pub context: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected '{}', found '{}' at token {} (near: {})",
            self.expected,
            self.found.as_deref().unwrap_or("<EOF>"),
            self.position,
            self.context
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DnaError {
    #[error("Syntax error: {0}")]
    Syntax(SyntaxError),
    #[error("Configuration error: invalid value \"{value}\" for {field}")]
    Configuration { field: String, value: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
}

impl DnaError {
    pub(crate) fn configuration(field: &str, value: impl Into<String>) -> Self {
        DnaError::Configuration {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

impl From<SyntaxError> for DnaError {
    fn from(error: SyntaxError) -> Self {
        DnaError::Syntax(error)
    }
}

impl From<std::io::Error> for DnaError {
    fn from(error: std::io::Error) -> Self {
        DnaError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for DnaError {
    fn from(error: serde_json::Error) -> Self {
        DnaError::Json(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnaError>;
