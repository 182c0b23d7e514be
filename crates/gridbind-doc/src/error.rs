use thiserror::Error;

/// Fatal document-level failures.
///
/// These abort a whole import/export operation; per-row validation problems
/// never surface here (they flow to the caller's hooks as data).
#[derive(Debug, Error)]
pub enum DocError {
    /// The document stream could not be read.
    #[error("failed to read document: {0}")]
    Read(#[from] std::io::Error),

    /// The document bytes are not in a supported format.
    #[error("unsupported or corrupt document format: {message}")]
    Format { message: String },

    /// The document parsed but its structure does not match what the
    /// template-driven operation expects.
    #[error("template structure mismatch: {message}")]
    Template { message: String },

    /// A sheet referenced by name does not exist in the document.
    #[error("sheet `{sheet}` not found in document")]
    MissingSheet { sheet: String },
}

impl DocError {
    pub fn format(message: impl Into<String>) -> Self {
        DocError::Format {
            message: message.into(),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        DocError::Template {
            message: message.into(),
        }
    }

    pub fn missing_sheet(sheet: impl Into<String>) -> Self {
        DocError::MissingSheet {
            sheet: sheet.into(),
        }
    }
}
