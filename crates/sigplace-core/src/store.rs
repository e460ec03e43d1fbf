//! The loaded document and its committed byte snapshot
//!
//! `DocumentStore` is a cheap `Clone` handle; every clone sees the same
//! document. Operations are single-flight: a call that finds the store in use
//! fails with [`SigPlaceError::Busy`] instead of waiting, so an embed can
//! never interleave with a reload or an export.

use crate::artifact::ImageArtifact;
use crate::config::{SessionConfig, PDF_MIME_TYPE};
use crate::coords::{PageGeometry, PageRect};
use crate::embed::DocumentEmbedder;
use crate::error::{Result, SigPlaceError};
use crate::page;
use lopdf::Document;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A file handed over by the file picker
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// What the UI needs to know about the loaded document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub version: String,
    pub page_count: usize,
    pub size_bytes: usize,
    /// Number of embeds committed since the upload
    pub revision: u32,
}

/// Everything needed to composite one signature
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub page_index: usize,
    pub artifact: Arc<ImageArtifact>,
    /// Placement relative to the page box
    pub rect: PageRect,
    pub compress: bool,
}

#[derive(Debug, Clone)]
pub struct EmbedOutcome {
    /// Serialized document after the embed
    pub bytes: Vec<u8>,
    pub page_index: usize,
    pub rect: PageRect,
    /// Resource name the image was registered under
    pub xobject: String,
    pub revision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

struct LoadedDocument {
    name: String,
    version: String,
    document: Document,
    /// Bytes of the last committed state, served to the viewer and to export
    bytes: Vec<u8>,
    revision: u32,
}

impl LoadedDocument {
    fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            version: self.version.clone(),
            page_count: self.document.get_pages().len(),
            size_bytes: self.bytes.len(),
            revision: self.revision,
        }
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    slot: Arc<Mutex<Option<LoadedDocument>>>,
    config: Arc<SessionConfig>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl DocumentStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            config: Arc::new(config),
        }
    }

    fn acquire(&self, operation: &'static str) -> Result<MutexGuard<'_, Option<LoadedDocument>>> {
        self.slot.try_lock().map_err(|_| {
            tracing::warn!(operation, "document store is busy");
            SigPlaceError::Busy
        })
    }

    /// Validate, parse and keep an uploaded PDF, replacing any previous one.
    ///
    /// A rejected upload leaves the current document untouched.
    pub async fn load(&self, upload: Upload) -> Result<DocumentSummary> {
        let mut slot = self.acquire("load")?;

        if !self.config.accepts_mime(&upload.mime_type) {
            tracing::warn!(name = %upload.name, mime = %upload.mime_type, "rejected upload with unsupported type");
            return Err(SigPlaceError::InvalidFileType(upload.mime_type));
        }
        if !upload.bytes.starts_with(b"%PDF-") {
            tracing::warn!(name = %upload.name, "rejected upload without a PDF header");
            return Err(SigPlaceError::InvalidFileType(
                "missing %PDF- header".to_string(),
            ));
        }

        let document = Document::load_mem(&upload.bytes)
            .map_err(|e| SigPlaceError::DocumentParse(e.to_string()))?;
        if document.is_encrypted() {
            return Err(SigPlaceError::DocumentParse(
                "encrypted documents are not supported".to_string(),
            ));
        }
        if document.get_pages().is_empty() {
            return Err(SigPlaceError::DocumentParse("document has no pages".to_string()));
        }

        let loaded = LoadedDocument {
            name: upload.name,
            version: extract_version(&upload.bytes),
            document,
            bytes: upload.bytes,
            revision: 0,
        };
        let summary = loaded.summary();
        *slot = Some(loaded);

        tracing::info!(
            name = %summary.name,
            pages = summary.page_count,
            size_bytes = summary.size_bytes,
            "document loaded"
        );
        Ok(summary)
    }

    /// Whether a document is present. A busy store is always mid-operation on one.
    pub fn is_loaded(&self) -> bool {
        self.slot.try_lock().map(|slot| slot.is_some()).unwrap_or(true)
    }

    pub fn summary(&self) -> Result<DocumentSummary> {
        let slot = self.acquire("summary")?;
        slot.as_ref()
            .map(LoadedDocument::summary)
            .ok_or(SigPlaceError::NoDocumentLoaded)
    }

    pub fn page_geometry(&self, page_index: usize) -> Result<PageGeometry> {
        let slot = self.acquire("page_geometry")?;
        let loaded = slot.as_ref().ok_or(SigPlaceError::NoDocumentLoaded)?;
        page::page_geometry(&loaded.document, page_index)
    }

    /// Bytes of the current committed document, for rendering
    pub fn document_bytes(&self) -> Result<Vec<u8>> {
        let slot = self.acquire("document_bytes")?;
        slot.as_ref()
            .map(|loaded| loaded.bytes.clone())
            .ok_or(SigPlaceError::NoDocumentLoaded)
    }

    /// Composite the signature and commit the result.
    ///
    /// The embed runs on a copy of the document; the store only changes once
    /// the copy has been serialized successfully.
    pub async fn embed(&self, request: EmbedRequest) -> Result<EmbedOutcome> {
        let mut slot = self.acquire("embed")?;
        let loaded = slot.as_mut().ok_or(SigPlaceError::NoDocumentLoaded)?;

        let mut working = loaded.document.clone();
        let geometry = page::page_geometry(&working, request.page_index)?;
        let embedder = DocumentEmbedder::new(request.compress);
        let xobject = embedder.embed(
            &mut working,
            request.page_index,
            request.artifact.image(),
            &request.rect,
            &geometry,
        )?;
        let bytes = DocumentEmbedder::serialize(&mut working).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize signed document");
            e
        })?;

        loaded.document = working;
        loaded.bytes = bytes.clone();
        loaded.revision += 1;

        tracing::info!(
            page = request.page_index,
            xobject = %xobject,
            revision = loaded.revision,
            size_bytes = bytes.len(),
            "signature embedded"
        );
        Ok(EmbedOutcome {
            bytes,
            page_index: request.page_index,
            rect: request.rect,
            xobject,
            revision: loaded.revision,
        })
    }

    /// Hand out the committed document for download
    pub async fn export(&self) -> Result<ExportedDocument> {
        let slot = self.acquire("export")?;
        let loaded = slot.as_ref().ok_or(SigPlaceError::NoDocumentLoaded)?;

        tracing::info!(
            filename = %self.config.export_filename,
            revision = loaded.revision,
            size_bytes = loaded.bytes.len(),
            "document exported"
        );
        Ok(ExportedDocument {
            filename: self.config.export_filename.clone(),
            mime_type: PDF_MIME_TYPE.to_string(),
            bytes: loaded.bytes.clone(),
        })
    }

    /// Drop the loaded document
    pub fn clear(&self) -> Result<()> {
        let mut slot = self.acquire("clear")?;
        *slot = None;
        Ok(())
    }
}

/// Version from the `%PDF-1.7` header, `1.4` when unreadable
fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "1.4".to_string())
}
