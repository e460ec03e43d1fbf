//! Signature overlay placement
//!
//! The overlay lives in viewport pixels. Drag and resize are pure functions of
//! `(current rect, delta, viewport)` so any event system can drive them and the
//! clamping rules stay the same.

use crate::coords::{OverlayRect, ViewportRect};
use serde::Serialize;

/// Where the overlay is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverlayPhase {
    /// No signature created yet
    Unplaced,
    /// Signature created, overlay visible and interactive
    Placed,
    /// Signature composited into the document, overlay hidden
    Embedded,
}

/// Move the overlay by `(dx, dy)`, clamping the position so it stays inside the viewport.
pub fn drag(rect: &OverlayRect, dx: f64, dy: f64, viewport: &ViewportRect) -> OverlayRect {
    let max_x = (viewport.width - rect.width).max(0.0);
    let max_y = (viewport.height - rect.height).max(0.0);
    // NaN is dropped; an infinite delta pins the overlay to that edge
    let or_previous = |v: f64, previous: f64| if v.is_nan() { previous } else { v };

    OverlayRect {
        x: or_previous(rect.x + dx, rect.x).clamp(0.0, max_x),
        y: or_previous(rect.y + dy, rect.y).clamp(0.0, max_y),
        width: rect.width,
        height: rect.height,
    }
}

/// Grow or shrink the overlay by `(dw, dh)` keeping its top-left corner.
///
/// A resize that would cross the viewport edge, or collapse the overlay to a
/// non-positive size, is rejected and the current rect is returned unchanged.
pub fn resize(rect: &OverlayRect, dw: f64, dh: f64, viewport: &ViewportRect) -> OverlayRect {
    let candidate = OverlayRect {
        width: rect.width + dw,
        height: rect.height + dh,
        ..*rect
    };

    if candidate.fits_in(viewport) {
        candidate
    } else {
        *rect
    }
}

/// Force a rect inside the viewport: shrink it to the viewport if needed, then clamp its position.
pub fn fit_within(rect: &OverlayRect, viewport: &ViewportRect) -> OverlayRect {
    let width = rect.width.min(viewport.width);
    let height = rect.height.min(viewport.height);
    drag(
        &OverlayRect {
            width,
            height,
            ..*rect
        },
        0.0,
        0.0,
        viewport,
    )
}

/// Current overlay placement plus its lifecycle phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayState {
    phase: OverlayPhase,
    rect: OverlayRect,
    viewport: Option<ViewportRect>,
}

impl OverlayState {
    /// New overlay that will start at `initial` once a signature is placed
    pub fn new(initial: OverlayRect) -> Self {
        Self {
            phase: OverlayPhase::Unplaced,
            rect: initial,
            viewport: None,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn rect(&self) -> OverlayRect {
        self.rect
    }

    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport
    }

    /// Whether the overlay should currently be drawn on top of the viewer
    pub fn is_visible(&self) -> bool {
        self.phase == OverlayPhase::Placed
    }

    /// Record the viewer's current size and re-fit the overlay to it
    pub fn set_viewport(&mut self, viewport: ViewportRect) {
        self.rect = fit_within(&self.rect, &viewport);
        self.viewport = Some(viewport);
    }

    /// A signature was captured: show the overlay where it was last left
    pub fn place(&mut self) {
        if let Some(viewport) = &self.viewport {
            self.rect = fit_within(&self.rect, viewport);
        }
        self.phase = OverlayPhase::Placed;
    }

    pub fn drag(&mut self, dx: f64, dy: f64) -> OverlayRect {
        if let (OverlayPhase::Placed, Some(viewport)) = (self.phase, &self.viewport) {
            self.rect = drag(&self.rect, dx, dy, viewport);
        }
        self.rect
    }

    pub fn resize(&mut self, dw: f64, dh: f64) -> OverlayRect {
        if let (OverlayPhase::Placed, Some(viewport)) = (self.phase, &self.viewport) {
            self.rect = resize(&self.rect, dw, dh, viewport);
        }
        self.rect
    }

    pub fn mark_embedded(&mut self) {
        self.phase = OverlayPhase::Embedded;
    }

    /// Signature cleared: hide the overlay. The placement is kept for the next signature.
    pub fn clear(&mut self) {
        self.phase = OverlayPhase::Unplaced;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Gesture {
        Drag(f64, f64),
        Resize(f64, f64),
    }

    fn gesture() -> impl Strategy<Value = Gesture> {
        prop_oneof![
            (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(dx, dy)| Gesture::Drag(dx, dy)),
            (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(dw, dh)| Gesture::Resize(dw, dh)),
        ]
    }

    proptest! {
        /// Property: any sequence of drags and resizes keeps the overlay inside the viewport
        #[test]
        fn gestures_preserve_bounds_invariant(
            vw in 1.0f64..2000.0,
            vh in 1.0f64..2000.0,
            gestures in prop::collection::vec(gesture(), 0..40),
        ) {
            let viewport = ViewportRect::sized(vw, vh);
            let mut state = OverlayState::new(OverlayRect::new(100.0, 100.0, 150.0, 50.0));
            state.set_viewport(viewport);
            state.place();
            prop_assert!(state.rect().fits_in(&viewport), "placed rect {:?} outside {:?}", state.rect(), viewport);

            for g in gestures {
                match &g {
                    Gesture::Drag(dx, dy) => { state.drag(*dx, *dy); }
                    Gesture::Resize(dw, dh) => { state.resize(*dw, *dh); }
                }
                let rect = state.rect();
                prop_assert!(rect.fits_in(&viewport), "rect {:?} escaped {:?} after {:?}", rect, viewport, g);
            }
        }

        /// Property: drag never changes the overlay size
        #[test]
        fn drag_preserves_size(
            dx in -1000.0f64..1000.0,
            dy in -1000.0f64..1000.0,
        ) {
            let rect = OverlayRect::new(10.0, 10.0, 80.0, 30.0);
            let moved = drag(&rect, dx, dy, &ViewportRect::sized(300.0, 500.0));
            prop_assert_eq!(moved.width, rect.width);
            prop_assert_eq!(moved.height, rect.height);
        }

        /// Property: resize never moves the overlay
        #[test]
        fn resize_preserves_position(
            dw in -200.0f64..200.0,
            dh in -200.0f64..200.0,
        ) {
            let rect = OverlayRect::new(10.0, 10.0, 80.0, 30.0);
            let resized = resize(&rect, dw, dh, &ViewportRect::sized(300.0, 500.0));
            prop_assert_eq!(resized.x, rect.x);
            prop_assert_eq!(resized.y, rect.y);
        }
    }
}
