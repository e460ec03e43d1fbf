//! Coordinate transformation between the viewer surface and PDF page space
//!
//! Viewport space: pixels, origin top-left, Y grows downward.
//! Page space: PDF user units, origin bottom-left of the page box, Y grows upward.
//!
//! The X and Y scale factors are computed independently. A viewer is free to
//! stretch a page into a box with a different aspect ratio, and the placement
//! follows that stretch rather than letterboxing it.

use crate::error::{Result, SigPlaceError};
use serde::{Deserialize, Serialize};

/// On-screen rectangle of the rendered page surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport of the given size anchored at the screen origin
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Reject dimensions the mapper cannot divide by
    pub fn validate(&self) -> Result<()> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) {
            Ok(())
        } else {
            Err(SigPlaceError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Slack allowed on the far edges, so `x + width` landing one ulp past the
/// viewport after clamping still counts as inside.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Signature overlay rectangle, relative to the viewport's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle sits entirely inside the viewport with a positive size
    pub fn fits_in(&self, viewport: &ViewportRect) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= viewport.width + EDGE_TOLERANCE
            && self.y + self.height <= viewport.height + EDGE_TOLERANCE
    }
}

/// Rectangle in page space, anchored at its bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageRect {
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Native size of a page, taken from its MediaBox
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Lower-left corner of the page box
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width,
            height,
            rotation: 0,
        }
    }

    /// Build from a `[llx, lly, urx, ury]` box
    pub fn from_box(media_box: [f64; 4], rotation: i32) -> Self {
        let [llx, lly, urx, ury] = media_box;
        Self {
            origin_x: llx.min(urx),
            origin_y: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
            rotation,
        }
    }

    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }
}

/// Maps viewport-space rectangles onto one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    viewport_width: f64,
    viewport_height: f64,
    scale_x: f64,
    scale_y: f64,
}

impl CoordinateMapper {
    pub fn new(viewport: &ViewportRect, page: &PageGeometry) -> Result<Self> {
        viewport.validate()?;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(page.width) || !usable(page.height) {
            return Err(SigPlaceError::InvalidPage(format!(
                "page has unusable size {}x{}",
                page.width, page.height
            )));
        }

        Ok(Self {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            scale_x: page.width / viewport.width,
            scale_y: page.height / viewport.height,
        })
    }

    /// Page units per viewport pixel, per axis
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Convert an overlay to page space.
    ///
    /// The returned `y` is the rectangle's bottom edge, since images are drawn
    /// from their bottom-left corner.
    pub fn to_page(&self, overlay: &OverlayRect) -> PageRect {
        PageRect {
            x: overlay.x * self.scale_x,
            y: (self.viewport_height - overlay.y - overlay.height) * self.scale_y,
            width: overlay.width * self.scale_x,
            height: overlay.height * self.scale_y,
        }
    }

    /// Inverse of [`CoordinateMapper::to_page`] using the same scale factors
    pub fn to_viewport(&self, rect: &PageRect) -> OverlayRect {
        let width = rect.width / self.scale_x;
        let height = rect.height / self.scale_y;
        OverlayRect {
            x: rect.x / self.scale_x,
            y: self.viewport_height - rect.y / self.scale_y - height,
            width,
            height,
        }
    }

    /// Convert a single viewport point to page space (flip Y axis)
    pub fn point_to_page(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale_x, (self.viewport_height - y) * self.scale_y)
    }

    /// Convert a single page point to viewport space
    pub fn point_to_viewport(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.scale_x, self.viewport_height - y / self.scale_y)
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }
}
