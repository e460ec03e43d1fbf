//! Session configuration
//!
//! Every field has a default, so an empty JSON object (or no configuration at
//! all) gives the stock behavior: accept `application/pdf`, start the overlay
//! at (100, 100) with a 150 x 50 box, sign page 0, export as
//! `signed_document.pdf`.

use crate::coords::OverlayRect;
use crate::error::{Result, SigPlaceError};
use serde::{Deserialize, Serialize};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_EXPORT_FILENAME: &str = "signed_document.pdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// MIME types accepted on upload
    pub accepted_mime_types: Vec<String>,
    /// Suggested filename for the exported document
    pub export_filename: String,
    /// Zero-based page the signature is drawn on
    pub target_page: usize,
    /// Overlay position and size when a signature is first placed
    pub initial_overlay: OverlayRect,
    /// Flate-compress embedded image streams
    pub compress_images: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![PDF_MIME_TYPE.to_string()],
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            target_page: 0,
            initial_overlay: OverlayRect::new(100.0, 100.0, 150.0, 50.0),
            compress_images: true,
        }
    }
}

impl SessionConfig {
    /// Parse configuration from a JSON string and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SigPlaceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.accepted_mime_types.is_empty() {
            return Err(SigPlaceError::InvalidConfig(
                "accepted_mime_types must not be empty".to_string(),
            ));
        }
        if self.export_filename.trim().is_empty() {
            return Err(SigPlaceError::InvalidConfig(
                "export_filename must not be empty".to_string(),
            ));
        }
        let overlay = &self.initial_overlay;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(overlay.width) || !positive(overlay.height) {
            return Err(SigPlaceError::InvalidConfig(format!(
                "initial_overlay must have a positive size, got {}x{}",
                overlay.width, overlay.height
            )));
        }
        if !overlay.x.is_finite() || !overlay.y.is_finite() || overlay.x < 0.0 || overlay.y < 0.0 {
            return Err(SigPlaceError::InvalidConfig(format!(
                "initial_overlay position ({}, {}) is invalid",
                overlay.x, overlay.y
            )));
        }
        Ok(())
    }

    /// Case-insensitive MIME check, ignoring parameters such as `; charset=...`
    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.accepted_mime_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}
