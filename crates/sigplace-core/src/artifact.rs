//! Signature image artifacts
//!
//! A drawn signature arrives as PNG bytes, usually wrapped in a
//! `data:image/png;base64,...` URL produced by the signature pad. The artifact
//! keeps the encoded bytes (for echoing back to the overlay) and the decoded
//! pixels split into an RGB plane and an optional alpha plane, which is the
//! shape a PDF image XObject with a soft mask wants.

use crate::error::{Result, SigPlaceError};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::io::Cursor;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_MEDIA_TYPE: &str = "image/png";

/// Source of a drawn signature (the on-screen signature pad)
pub trait StrokeCapture {
    /// True when nothing has been drawn yet
    fn is_empty(&self) -> bool;

    /// Rasterize the current strokes as PNG
    fn to_png(&self) -> Result<Vec<u8>>;
}

/// 8-bit pixels ready to be written into a PDF image stream
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGB samples, `width * height * 3` bytes
    pub rgb: Vec<u8>,
    /// One alpha sample per pixel, `None` when every pixel is opaque
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    /// True when every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        match &self.alpha {
            Some(alpha) => alpha.iter().all(|&a| a == 0),
            None => false,
        }
    }
}

/// An immutable, validated signature image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    png: Vec<u8>,
    image: DecodedImage,
}

impl ImageArtifact {
    /// Capture the pad's current strokes
    pub fn capture(pad: &dyn StrokeCapture) -> Result<Self> {
        if pad.is_empty() {
            tracing::warn!("signature capture requested on an empty pad");
            return Err(SigPlaceError::EmptySignature);
        }
        Self::from_png(pad.to_png()?)
    }

    /// Validate and decode raw PNG bytes
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        validate_png(&png)?;
        let image = decode_png(&png)?;
        if image.is_blank() {
            tracing::warn!(
                width = image.width,
                height = image.height,
                "signature image has no visible pixels"
            );
            return Err(SigPlaceError::EmptySignature);
        }

        tracing::debug!(
            width = image.width,
            height = image.height,
            has_alpha = image.alpha.is_some(),
            bytes = png.len(),
            "decoded signature image"
        );
        Ok(Self { png, image })
    }

    /// Parse a `data:image/png;base64,...` URL (or a bare base64 PNG payload)
    pub fn from_data_url(url: &str) -> Result<Self> {
        let url = url.trim();
        let payload = match url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    SigPlaceError::UnsupportedImageFormat("malformed data URL".to_string())
                })?;
                let mut parts = header.split(';');
                let media_type = parts.next().unwrap_or_default().trim();
                if !media_type.eq_ignore_ascii_case(PNG_MEDIA_TYPE) {
                    return Err(SigPlaceError::UnsupportedImageFormat(media_type.to_string()));
                }
                if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
                    return Err(SigPlaceError::UnsupportedImageFormat(
                        "data URL is not base64-encoded".to_string(),
                    ));
                }
                payload
            }
            None => url,
        };

        if payload.trim().is_empty() {
            return Err(SigPlaceError::EmptySignature);
        }

        let png = B64
            .decode(payload.trim().as_bytes())
            .map_err(|e| SigPlaceError::UnsupportedImageFormat(format!("invalid base64: {}", e)))?;
        Self::from_png(png)
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    /// Pixel size of the signature image
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", PNG_MEDIA_TYPE, B64.encode(&self.png))
    }
}

fn validate_png(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(SigPlaceError::EmptySignature);
    }
    if bytes.starts_with(&PNG_MAGIC) {
        return Ok(());
    }

    let detected = if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") {
        "image/svg+xml"
    } else {
        "unknown (invalid PNG magic bytes)"
    };
    Err(SigPlaceError::UnsupportedImageFormat(detected.to_string()))
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage> {
    let decode_err = |e: png::DecodingError| SigPlaceError::UnsupportedImageFormat(format!("PNG decode failed: {}", e));

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    // Palette and sub-byte images become 8-bit RGB(A)/gray, 16-bit drops to 8-bit
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_err)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).map_err(decode_err)?;
    let pixels = &buf[..frame.buffer_size()];

    let pixel_count = frame.width as usize * frame.height as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);

    match frame.color_type {
        png::ColorType::Rgb => rgb.extend_from_slice(pixels),
        png::ColorType::Rgba => {
            for px in pixels.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
        }
        png::ColorType::Grayscale => {
            for &g in pixels {
                rgb.extend_from_slice(&[g, g, g]);
            }
        }
        png::ColorType::GrayscaleAlpha => {
            for px in pixels.chunks_exact(2) {
                rgb.extend_from_slice(&[px[0], px[0], px[0]]);
                alpha.push(px[1]);
            }
        }
        png::ColorType::Indexed => {
            return Err(SigPlaceError::UnsupportedImageFormat(
                "indexed PNG was not expanded".to_string(),
            ))
        }
    }

    let alpha = if alpha.iter().all(|&a| a == u8::MAX) {
        None
    } else {
        Some(alpha)
    };

    Ok(DecodedImage {
        width: frame.width,
        height: frame.height,
        rgb,
        alpha,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: bytes without the PNG signature are never accepted
        #[test]
        fn invalid_png_magic_rejected(
            garbage in prop::collection::vec(any::<u8>(), 1..100),
        ) {
            prop_assume!(!garbage.starts_with(&PNG_MAGIC));
            let result = ImageArtifact::from_png(garbage);
            prop_assert!(matches!(result, Err(SigPlaceError::UnsupportedImageFormat(_))));
        }

        /// Property: arbitrary data URLs never panic
        #[test]
        fn data_url_parsing_never_panics(input in ".{0,200}") {
            let _ = ImageArtifact::from_data_url(&input);
        }
    }
}
