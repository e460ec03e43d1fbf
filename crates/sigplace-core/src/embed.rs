//! Composite a signature image onto a PDF page
//!
//! The image becomes an `/XObject /Image` (with a `/SMask` when it has
//! transparency), registered in the page's resources under a name derived from
//! its object id (suffixed if the page already uses that name), and drawn by a content stream appended to the page:
//!
//! ```text
//! q <width> 0 0 <height> <x> <y> cm /SigImgN Do Q
//! ```
//!
//! Every call adds a new image; nothing tracks or replaces earlier ones.

use crate::artifact::DecodedImage;
use crate::coords::{PageGeometry, PageRect};
use crate::error::{Result, SigPlaceError};
use crate::page::{inherited_attribute, page_id, resolve};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct DocumentEmbedder {
    compress: bool,
}

impl Default for DocumentEmbedder {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl DocumentEmbedder {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Draw `image` on page `page_index` at `rect` (page space, relative to the page box).
    ///
    /// Returns the resource name the image was registered under.
    pub fn embed(
        &self,
        doc: &mut Document,
        page_index: usize,
        image: &DecodedImage,
        rect: &PageRect,
        geometry: &PageGeometry,
    ) -> Result<String> {
        if !rect.has_area() || !rect.x.is_finite() || !rect.y.is_finite() {
            return Err(SigPlaceError::EmptyPlacement {
                width: rect.width,
                height: rect.height,
            });
        }
        let page_id = page_id(doc, page_index)?;

        if geometry.rotation != 0 {
            tracing::warn!(
                page = page_index,
                rotation = geometry.rotation,
                "page is rotated; placement is applied in unrotated page space"
            );
        }

        let image_id = self.add_image(doc, image)?;
        let name = register_xobject(doc, page_id, image_id)?;

        let x = geometry.origin_x + rect.x;
        let y = geometry.origin_y + rect.y;
        let draw = format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            rect.width, rect.height, x, y, name
        );
        append_content(doc, page_id, draw.into_bytes())?;

        tracing::debug!(
            page = page_index,
            xobject = %name,
            x,
            y,
            width = rect.width,
            height = rect.height,
            "signature drawn"
        );
        Ok(name)
    }

    /// Serialize the whole document
    pub fn serialize(doc: &mut Document) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| SigPlaceError::SerializationFailure(e.to_string()))?;
        Ok(output)
    }

    fn add_image(&self, doc: &mut Document, image: &DecodedImage) -> Result<ObjectId> {
        let image_dict = |color_space: &str| {
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
            }
        };

        let smask_id = match &image.alpha {
            Some(alpha) => {
                let stream = self.stream(image_dict("DeviceGray"), alpha)?;
                Some(doc.add_object(stream))
            }
            None => None,
        };

        let mut dict = image_dict("DeviceRGB");
        if let Some(id) = smask_id {
            dict.set("SMask", id);
        }
        let stream = self.stream(dict, &image.rgb)?;
        Ok(doc.add_object(stream))
    }

    fn stream(&self, mut dict: Dictionary, data: &[u8]) -> Result<Stream> {
        if !self.compress {
            return Ok(Stream::new(dict, data.to_vec()));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| SigPlaceError::SerializationFailure(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| SigPlaceError::SerializationFailure(e.to_string()))?;
        dict.set("Filter", "FlateDecode");
        Ok(Stream::new(dict, compressed))
    }
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|_| SigPlaceError::InvalidPage("page object is not a dictionary".to_string()))
}

/// Register `image_id` in the page's `/Resources /XObject` dictionary and
/// return the name it was given.
///
/// The page ends up with its own inline copy of both dictionaries, whether they
/// were inherited from the page tree or shared through an indirect reference,
/// so the addition never shows up on other pages. The name is `SigImg<id>`,
/// suffixed when the page already uses it.
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String> {
    let own = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|_| SigPlaceError::InvalidPage("page object is not a dictionary".to_string()))?
        .get(b"Resources")
        .ok()
        .map(|obj| resolve(doc, obj).clone());

    let mut resources = match own.or_else(|| inherited_attribute(doc, page_id, b"Resources")) {
        Some(Object::Dictionary(dict)) => dict,
        Some(_) => {
            return Err(SigPlaceError::InvalidPage(
                "Resources is not a dictionary".to_string(),
            ))
        }
        None => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject").map(|obj| resolve(doc, obj)) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(_) => {
            return Err(SigPlaceError::InvalidPage(
                "XObject is not a dictionary".to_string(),
            ))
        }
        Err(_) => Dictionary::new(),
    };

    let name = unused_name(&xobjects, &format!("SigImg{}", image_id.0));
    xobjects.set(name.as_str(), image_id);
    resources.set("XObject", Object::Dictionary(xobjects));
    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// `base`, or `base_2`, `base_3`, ... if the dictionary already has that key
fn unused_name(xobjects: &Dictionary, base: &str) -> String {
    let mut name = base.to_string();
    let mut suffix = 2;
    while xobjects.get(name.as_bytes()).is_ok() {
        name = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    name
}

/// Append `draw` to the page contents.
///
/// Existing content is bracketed by `q`/`Q` streams so graphics state it leaves
/// behind (an unbalanced `cm`, for example) cannot shift the signature.
fn append_content(doc: &mut Document, page_id: ObjectId, draw: Vec<u8>) -> Result<()> {
    let existing = {
        let page = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|_| SigPlaceError::InvalidPage("page object is not a dictionary".to_string()))?;
        match page.get(b"Contents") {
            Ok(contents) => match resolve(doc, contents) {
                Object::Array(items) => Some(items.clone()),
                _ => Some(vec![contents.clone()]),
            },
            Err(_) => None,
        }
    };

    let draw_id = doc.add_object(Stream::new(Dictionary::new(), draw));

    let contents = match existing {
        None => Object::Reference(draw_id),
        Some(mut streams) => {
            let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let close_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            streams.insert(0, Object::Reference(open_id));
            streams.push(Object::Reference(close_id));
            streams.push(Object::Reference(draw_id));
            Object::Array(streams)
        }
    };

    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}
