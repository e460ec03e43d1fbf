//! Place a drawn signature on a PDF page and bake it into the document
//!
//! The user draws a signature, drags and resizes it over a rendered page, and
//! the overlay is composited into the PDF as an image at the matching page
//! coordinates. Everything here runs client-side on lopdf.
//!
//! - [`coords`]: viewport <-> page space mapping
//! - [`overlay`]: overlay lifecycle and drag/resize clamping
//! - [`artifact`]: decoded signature images
//! - [`embed`]: image XObject injection and content stream drawing
//! - [`store`]: single-flight holder of the loaded document
//! - [`session`]: the orchestration a UI drives

pub mod artifact;
pub mod config;
pub mod coords;
pub mod embed;
pub mod error;
pub mod overlay;
pub mod page;
pub mod session;
pub mod store;

pub use artifact::{DecodedImage, ImageArtifact, StrokeCapture};
pub use config::SessionConfig;
pub use coords::{CoordinateMapper, OverlayRect, PageGeometry, PageRect, ViewportRect};
pub use embed::DocumentEmbedder;
pub use error::{Result, SigPlaceError};
pub use overlay::{OverlayPhase, OverlayState};
pub use session::SignatureSession;
pub use store::{DocumentStore, DocumentSummary, EmbedOutcome, EmbedRequest, ExportedDocument, Upload};
