use gridbind_doc::DocError;
use thiserror::Error;

/// Fatal binding failures.
///
/// Per-row validation problems never appear here; they are reported to the
/// caller's hooks as [`crate::FailedInfo`] values while the batch continues.
#[derive(Debug, Error)]
pub enum BindError {
    /// A configured date-format pattern did not compile. Caught at metadata
    /// construction so a bad format string surfaces at startup, not
    /// mid-batch.
    #[error("invalid date pattern `{pattern}` for field `{field}`")]
    InvalidDatePattern { field: String, pattern: String },

    /// Document-level failure (unreadable stream, bad format, missing
    /// sheet, template mismatch).
    #[error(transparent)]
    Doc(#[from] DocError),
}
