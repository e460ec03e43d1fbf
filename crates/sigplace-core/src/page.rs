//! Page lookup and page-level attributes
//!
//! Pages are addressed by zero-based index here; lopdf numbers them from 1.

use crate::coords::PageGeometry;
use crate::error::{Result, SigPlaceError};
use lopdf::{Document, Object, ObjectId};

/// US Letter, used when neither the page nor its ancestors carry a MediaBox
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guard against `Parent` cycles in malformed page trees
const MAX_TREE_DEPTH: usize = 64;

/// Object id of the page at `page_index` (zero-based)
pub fn page_id(doc: &Document, page_index: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    u32::try_from(page_index)
        .ok()
        .and_then(|i| i.checked_add(1))
        .and_then(|page_num| pages.get(&page_num).copied())
        .ok_or_else(|| {
            SigPlaceError::InvalidPage(format!(
                "page {} not found (document has {} pages)",
                page_index,
                pages.len()
            ))
        })
}

/// Native size, origin and rotation of the page at `page_index`
pub fn page_geometry(doc: &Document, page_index: usize) -> Result<PageGeometry> {
    let id = page_id(doc, page_index)?;

    let media_box = match inherited_attribute(doc, id, b"MediaBox") {
        Some(Object::Array(array)) => parse_box_array(doc, &array)?,
        Some(_) => {
            return Err(SigPlaceError::InvalidPage(
                "MediaBox is not an array".to_string(),
            ))
        }
        None => DEFAULT_MEDIA_BOX,
    };

    let rotation = inherited_attribute(doc, id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .map(normalize_rotation)
        .unwrap_or(0);

    Ok(PageGeometry::from_box(media_box, rotation))
}

/// Look up `key` on the page, falling back to its ancestors in the page tree.
/// References are resolved one level.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
        depth += 1;
    }

    None
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Parse a box array [x1, y1, x2, y2]; elements may be indirect
fn parse_box_array(doc: &Document, array: &[Object]) -> Result<[f64; 4]> {
    if array.len() != 4 {
        return Err(SigPlaceError::InvalidPage(
            "MediaBox must have 4 elements".to_string(),
        ));
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match resolve(doc, obj) {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => {
                return Err(SigPlaceError::InvalidPage(format!(
                    "MediaBox element {} is not a number",
                    i
                )))
            }
        };
    }

    Ok(result)
}

/// Reduce `/Rotate` to 0, 90, 180 or 270.
///
/// Values that are not multiples of 90 are invalid; they snap down to the
/// previous quarter turn.
fn normalize_rotation(angle: i64) -> i32 {
    match angle.rem_euclid(360) / 90 {
        1 => 90,
        2 => 180,
        3 => 270,
        _ => 0,
    }
}
