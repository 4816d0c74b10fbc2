use thiserror::Error;

/// Failures a single submission can end in. None of them is fatal to the
/// process; the form is always re-rendered with the description.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// Missing document, blank question, or an upload that is not a PDF.
    #[error("{0}")]
    Validation(String),

    /// Anything that went wrong while calling the generation API.
    #[error("{0}")]
    ExternalCall(String),

    /// The uploaded document could not be written to or read back from disk.
    #[error("failed to stage uploaded document: {0}")]
    Staging(#[source] std::io::Error),
}

impl EstimateError {
    #[cfg(test)]
    pub(crate) fn is_validation(&self) -> bool {
        matches!(self, EstimateError::Validation(_))
    }
}
