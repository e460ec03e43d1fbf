//! Browser-facing signing workspace
//!
//! All exported methods take `&self`: the session sits in a `RefCell` that is
//! only borrowed for synchronous steps, so the page can keep dragging the
//! overlay while an embed or export promise is pending.

use serde::Serialize;
use sigplace_core::{
    DocumentStore, OverlayPhase, OverlayRect, SessionConfig, SigPlaceError, SignatureSession,
    Upload, ViewportRect,
};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

/// What the page needs to draw the overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub phase: &'static str,
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayView {
    fn new(phase: OverlayPhase, rect: OverlayRect) -> Self {
        Self {
            phase: phase_name(phase),
            visible: phase == OverlayPhase::Placed,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

pub(crate) fn phase_name(phase: OverlayPhase) -> &'static str {
    match phase {
        OverlayPhase::Unplaced => "unplaced",
        OverlayPhase::Placed => "placed",
        OverlayPhase::Embedded => "embedded",
    }
}

/// Log the detail for developers, hand the alert text to the page
fn to_js(err: SigPlaceError) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    JsValue::from_str(&err.user_message())
}

fn to_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_uint8_array(bytes: &[u8]) -> js_sys::Uint8Array {
    let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
    array.copy_from(bytes);
    array
}

#[wasm_bindgen]
pub struct SignatureWorkspace {
    session: RefCell<SignatureSession>,
    store: DocumentStore,
}

impl SignatureWorkspace {
    /// Build from optional JSON configuration (testable without JsValue)
    fn from_config_json(config_json: Option<&str>) -> Result<Self, SigPlaceError> {
        let config = match config_json.map(str::trim).filter(|json| !json.is_empty()) {
            Some(json) => SessionConfig::from_json(json)?,
            None => SessionConfig::default(),
        };
        let session = SignatureSession::new(config)?;
        let store = session.store().clone();
        Ok(Self {
            session: RefCell::new(session),
            store,
        })
    }

    fn overlay_view(&self) -> OverlayView {
        let session = self.session.borrow();
        OverlayView::new(session.phase(), session.overlay().rect())
    }
}

#[wasm_bindgen]
impl SignatureWorkspace {
    /// Create a workspace, optionally configured with a JSON string
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SignatureWorkspace, JsValue> {
        Self::from_config_json(config_json.as_deref()).map_err(to_js)
    }

    /// Validate and load the selected file. Resolves to the document summary.
    #[wasm_bindgen(js_name = loadDocument)]
    pub async fn load_document(
        &self,
        name: String,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Result<JsValue, JsValue> {
        let summary = self
            .store
            .load(Upload {
                name,
                mime_type,
                bytes,
            })
            .await
            .map_err(to_js)?;
        self.session.borrow_mut().document_loaded();
        to_value(&summary)
    }

    /// Report the rendered page's bounding box, in CSS pixels
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&self, x: f64, y: f64, width: f64, height: f64) -> Result<JsValue, JsValue> {
        self.session
            .borrow_mut()
            .set_viewport(ViewportRect::new(x, y, width, height))
            .map_err(to_js)?;
        to_value(&self.overlay_view())
    }

    /// Use a `data:image/png;base64,...` URL from the signature pad
    #[wasm_bindgen(js_name = createSignature)]
    pub fn create_signature(&self, data_url: &str) -> Result<JsValue, JsValue> {
        self.session
            .borrow_mut()
            .create_signature_from_data_url(data_url)
            .map_err(to_js)?;
        to_value(&self.overlay_view())
    }

    #[wasm_bindgen(js_name = clearSignature)]
    pub fn clear_signature(&self) -> Result<JsValue, JsValue> {
        self.session.borrow_mut().clear_signature();
        to_value(&self.overlay_view())
    }

    /// Drag stopped: move by the accumulated delta. Returns the clamped overlay.
    pub fn drag(&self, dx: f64, dy: f64) -> Result<JsValue, JsValue> {
        self.session.borrow_mut().drag(dx, dy);
        to_value(&self.overlay_view())
    }

    /// Resize stopped: grow by the delta. Out-of-bounds resizes are ignored.
    pub fn resize(&self, dw: f64, dh: f64) -> Result<JsValue, JsValue> {
        self.session.borrow_mut().resize(dw, dh);
        to_value(&self.overlay_view())
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        phase_name(self.session.borrow().phase()).to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn overlay(&self) -> Result<JsValue, JsValue> {
        to_value(&self.overlay_view())
    }

    /// Page count of the loaded document, 0 when none is loaded
    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.store
            .summary()
            .map(|summary| summary.page_count as u32)
            .unwrap_or(0)
    }

    /// Data URL of the current signature, for the overlay `<img>`
    #[wasm_bindgen(getter, js_name = signatureDataUrl)]
    pub fn signature_data_url(&self) -> Option<String> {
        self.session.borrow().artifact().map(|a| a.to_data_url())
    }

    /// Current document bytes for PDF.js rendering
    #[wasm_bindgen(js_name = documentBytes)]
    pub fn document_bytes(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.store.document_bytes().map_err(to_js)?;
        Ok(to_uint8_array(&bytes))
    }

    /// Composite the signature into the document. Resolves to the new document bytes.
    #[wasm_bindgen(js_name = embedSignature)]
    pub async fn embed_signature(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let request = self.session.borrow().begin_embed().map_err(to_js)?;
        let outcome = self.store.embed(request).await.map_err(to_js)?;
        self.session.borrow_mut().complete_embed(&outcome);
        Ok(to_uint8_array(&outcome.bytes))
    }

    /// Resolves to `{ filename, mimeType, bytes }` for the download link
    #[wasm_bindgen(js_name = exportDocument)]
    pub async fn export_document(&self) -> Result<JsValue, JsValue> {
        let exported = self.store.export().await.map_err(to_js)?;

        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"filename".into(), &exported.filename.into())?;
        js_sys::Reflect::set(&result, &"mimeType".into(), &exported.mime_type.into())?;
        js_sys::Reflect::set(&result, &"bytes".into(), &to_uint8_array(&exported.bytes))?;
        Ok(result.into())
    }
}
