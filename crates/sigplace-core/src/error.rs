use thiserror::Error;

pub type Result<T> = std::result::Result<T, SigPlaceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SigPlaceError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Failed to parse PDF: {0}")]
    DocumentParse(String),

    #[error("Signature is empty")]
    EmptySignature,

    #[error("No signature has been created")]
    NoImageArtifact,

    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("No document loaded")]
    NoDocumentLoaded,

    #[error("Invalid viewport: {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Placement has zero area: {width}x{height}")]
    EmptyPlacement { width: f64, height: f64 },

    #[error("Serialization error: {0}")]
    SerializationFailure(String),

    #[error("Another operation is already running on this document")]
    Busy,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SigPlaceError {
    /// Text shown to the user when an operation is rejected.
    pub fn user_message(&self) -> String {
        match self {
            SigPlaceError::InvalidFileType(_) => "Please select a valid PDF file.".to_string(),
            SigPlaceError::DocumentParse(_) => "The selected PDF could not be opened.".to_string(),
            SigPlaceError::EmptySignature => "Please draw a signature first.".to_string(),
            SigPlaceError::NoImageArtifact => {
                "Please create a signature first and upload a PDF.".to_string()
            }
            SigPlaceError::NoDocumentLoaded => "Please upload a PDF first.".to_string(),
            SigPlaceError::InvalidViewport { .. } => {
                "The document view is not ready yet. Try again once it is visible.".to_string()
            }
            SigPlaceError::Busy => "Please wait for the current operation to finish.".to_string(),
            SigPlaceError::SerializationFailure(_) => {
                "Something went wrong while saving the document.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_failure_hides_details() {
        let err = SigPlaceError::SerializationFailure("xref offset overflow".to_string());
        assert!(!err.user_message().contains("xref"));
        assert!(err.to_string().contains("xref"));
    }

    #[test]
    fn test_invalid_page_message_passes_through() {
        let err = SigPlaceError::InvalidPage("page 3 not found".to_string());
        assert_eq!(err.user_message(), "Invalid page: page 3 not found");
    }
}
