//! WASM bindings for placing a drawn signature on a PDF
//!
//! State lives in Rust (`SignatureWorkspace`); JavaScript renders the page
//! with PDF.js, hosts the signature pad canvas and forwards DOM events.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { SignatureWorkspace } from './pkg/sigplace_wasm.js';
//!
//! await init();
//!
//! const workspace = new SignatureWorkspace();
//! await workspace.loadDocument(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! renderPdf(workspace.documentBytes());
//!
//! const box = viewer.getBoundingClientRect();
//! workspace.setViewport(box.x, box.y, box.width, box.height);
//! workspace.createSignature(signaturePad.toDataURL('image/png'));
//!
//! // react-draggable / re-resizable stop handlers
//! workspace.drag(data.deltaX, data.deltaY);
//! workspace.resize(d.width, d.height);
//!
//! renderPdf(await workspace.embedSignature());
//! const { filename, mimeType, bytes } = await workspace.exportDocument();
//! ```
//!
//! Rejected operations throw the alert text meant for the user.

pub mod workspace;

use wasm_bindgen::prelude::*;

pub use workspace::{OverlayView, SignatureWorkspace};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
