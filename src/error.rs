use thiserror::Error;

/// A failure decoding a compiled template from its JSON form.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {message} ({code})")]
pub struct DecodeError {
    pub code: &'static str,
    pub message: String,
    /// JSON-pointer-like location of the offending node, e.g. `/statements/2/1`.
    pub location: String,
}

impl DecodeError {
    pub fn new(code: &'static str, message: impl Into<String>, location: &str) -> Self {
        DecodeError {
            code,
            message: message.into(),
            location: if location.is_empty() {
                "/".to_string()
            } else {
                location.to_string()
            },
        }
    }
}

/// Errors raised while evaluating or rendering.
///
/// The visitors never construct these themselves except for
/// `MissingTemplate`; everything else comes from `Environment` hooks and is
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Helper not found: {0}")]
    MissingHelper(String),

    #[error("Template id {0} is out of range")]
    MissingTemplate(usize),

    #[error("Helper failed: {0}")]
    Helper(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
