//! Property-based tests for upload validation and placement mapping

#[path = "common/fixtures.rs"]
mod fixtures;

use fixtures::{create_test_pdf, signature_png};
use proptest::prelude::*;
use sigplace_core::{DocumentStore, SigPlaceError, SignatureSession, Upload, ViewportRect};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// MIME types a file picker might report for things that are not PDFs
fn other_mime_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("image/png".to_string()),
        Just("image/jpeg".to_string()),
        Just("text/plain".to_string()),
        Just("application/octet-stream".to_string()),
        Just("".to_string()),
        "[a-z]{1,10}/[a-z]{1,10}",
    ]
    .prop_filter("not a PDF type", |m| m != "application/pdf")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a rejected upload never replaces the loaded document
    #[test]
    fn rejected_upload_keeps_previous_document(
        mime in other_mime_type(),
        bytes in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let rt = runtime();
        let store = DocumentStore::default();
        let original = create_test_pdf(1, 612.0, 792.0);
        rt.block_on(store.load(Upload {
            name: "original.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: original.clone(),
        })).unwrap();

        let result = rt.block_on(store.load(Upload {
            name: "other".to_string(),
            mime_type: mime,
            bytes,
        }));

        prop_assert!(matches!(result, Err(SigPlaceError::InvalidFileType(_))));
        prop_assert_eq!(store.document_bytes().unwrap(), original);
    }

    /// Property: garbage labelled as PDF is rejected without panicking
    #[test]
    fn garbage_pdf_is_rejected(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let rt = runtime();
        let store = DocumentStore::default();
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend(tail);

        let result = rt.block_on(store.load(Upload {
            name: "broken.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes,
        }));

        prop_assert!(matches!(result, Err(SigPlaceError::DocumentParse(_))));
        prop_assert!(!store.is_loaded());
    }

    /// Property: wherever the overlay is dragged, the embedded image stays on the page
    #[test]
    fn embedded_rect_stays_on_page(
        vw in 100.0f64..1200.0,
        vh in 100.0f64..1600.0,
        dx in -2000.0f64..2000.0,
        dy in -2000.0f64..2000.0,
    ) {
        let rt = runtime();
        let mut session = SignatureSession::default();
        rt.block_on(session.upload("a.pdf", "application/pdf", create_test_pdf(1, 612.0, 792.0))).unwrap();
        session.set_viewport(ViewportRect::sized(vw, vh)).unwrap();
        session.create_signature_from_png(signature_png(30, 10)).unwrap();
        session.drag(dx, dy);

        let request = session.begin_embed().unwrap();
        let rect = request.rect;
        let tolerance = 1e-6;
        prop_assert!(rect.x >= -tolerance && rect.y >= -tolerance, "{:?}", rect);
        prop_assert!(rect.x + rect.width <= 612.0 + tolerance, "{:?}", rect);
        prop_assert!(rect.y + rect.height <= 792.0 + tolerance, "{:?}", rect);
    }
}
