//! One user's signing session
//!
//! Ties the pieces together: the uploaded document (through a
//! [`DocumentStore`] handle), the captured signature, the overlay the user
//! drags around, and the viewport it is measured against.
//!
//! Embedding is split in two so a caller that keeps the session behind a
//! `RefCell` never holds a borrow across the await:
//!
//! ```ignore
//! let request = session.begin_embed()?;
//! let outcome = session.store().clone().embed(request).await?;
//! session.complete_embed(&outcome);
//! ```

use crate::artifact::{ImageArtifact, StrokeCapture};
use crate::config::SessionConfig;
use crate::coords::{CoordinateMapper, OverlayRect, ViewportRect};
use crate::error::{Result, SigPlaceError};
use crate::overlay::{OverlayPhase, OverlayState};
use crate::store::{DocumentStore, DocumentSummary, EmbedOutcome, EmbedRequest, ExportedDocument, Upload};
use std::sync::Arc;

pub struct SignatureSession {
    config: SessionConfig,
    store: DocumentStore,
    overlay: OverlayState,
    artifact: Option<Arc<ImageArtifact>>,
}

impl Default for SignatureSession {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            store: DocumentStore::new(config.clone()),
            overlay: OverlayState::new(config.initial_overlay),
            artifact: None,
            config,
        }
    }
}

impl SignatureSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: DocumentStore::new(config.clone()),
            overlay: OverlayState::new(config.initial_overlay),
            artifact: None,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn phase(&self) -> OverlayPhase {
        self.overlay.phase()
    }

    pub fn artifact(&self) -> Option<&ImageArtifact> {
        self.artifact.as_deref()
    }

    /// Load a new document, replacing the current one
    pub async fn upload(
        &mut self,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DocumentSummary> {
        let upload = Upload {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        };
        let summary = self.store.load(upload).await?;
        self.document_loaded();
        Ok(summary)
    }

    /// Re-show the overlay for the new document when a signature is already captured
    pub fn document_loaded(&mut self) {
        if self.artifact.is_some() {
            self.overlay.place();
        } else {
            self.overlay.clear();
        }
    }

    /// Record the rendered page's on-screen size
    pub fn set_viewport(&mut self, viewport: ViewportRect) -> Result<()> {
        viewport.validate()?;
        self.overlay.set_viewport(viewport);
        Ok(())
    }

    /// Capture the pad and show the overlay.
    ///
    /// On failure the previous signature, if any, is kept.
    pub fn create_signature(&mut self, pad: &dyn StrokeCapture) -> Result<OverlayRect> {
        let artifact = ImageArtifact::capture(pad)?;
        Ok(self.use_artifact(artifact))
    }

    pub fn create_signature_from_png(&mut self, png: Vec<u8>) -> Result<OverlayRect> {
        let artifact = ImageArtifact::from_png(png)?;
        Ok(self.use_artifact(artifact))
    }

    pub fn create_signature_from_data_url(&mut self, url: &str) -> Result<OverlayRect> {
        let artifact = ImageArtifact::from_data_url(url)?;
        Ok(self.use_artifact(artifact))
    }

    fn use_artifact(&mut self, artifact: ImageArtifact) -> OverlayRect {
        self.artifact = Some(Arc::new(artifact));
        self.overlay.place();
        tracing::info!(rect = ?self.overlay.rect(), "signature placed");
        self.overlay.rect()
    }

    /// Drop the signature and hide the overlay
    pub fn clear_signature(&mut self) {
        self.artifact = None;
        self.overlay.clear();
    }

    pub fn drag(&mut self, dx: f64, dy: f64) -> OverlayRect {
        self.overlay.drag(dx, dy)
    }

    pub fn resize(&mut self, dw: f64, dh: f64) -> OverlayRect {
        self.overlay.resize(dw, dh)
    }

    /// Check preconditions and map the overlay onto the target page
    pub fn begin_embed(&self) -> Result<EmbedRequest> {
        let page_index = self.config.target_page;
        let geometry = self.store.page_geometry(page_index)?;
        let artifact = self.artifact.clone().ok_or_else(|| {
            tracing::warn!("embed requested without a signature");
            SigPlaceError::NoImageArtifact
        })?;
        let viewport = self.overlay.viewport().ok_or(SigPlaceError::InvalidViewport {
            width: 0.0,
            height: 0.0,
        })?;

        let mapper = CoordinateMapper::new(&viewport, &geometry)?;
        let overlay = self.overlay.rect();
        let rect = mapper.to_page(&overlay);
        if !rect.has_area() {
            return Err(SigPlaceError::EmptyPlacement {
                width: rect.width,
                height: rect.height,
            });
        }

        let (scale_x, scale_y) = mapper.scale();
        tracing::debug!(
            page = page_index,
            ?overlay,
            ?rect,
            scale_x,
            scale_y,
            "mapped overlay to page space"
        );
        Ok(EmbedRequest {
            page_index,
            artifact,
            rect,
            compress: self.config.compress_images,
        })
    }

    /// Hide the overlay after a committed embed
    pub fn complete_embed(&mut self, outcome: &EmbedOutcome) {
        tracing::debug!(revision = outcome.revision, "embed complete, hiding overlay");
        self.overlay.mark_embedded();
    }

    pub async fn embed(&mut self) -> Result<EmbedOutcome> {
        let request = self.begin_embed()?;
        let outcome = self.store.embed(request).await?;
        self.complete_embed(&outcome);
        Ok(outcome)
    }

    pub async fn export(&self) -> Result<ExportedDocument> {
        self.store.export().await
    }
}
