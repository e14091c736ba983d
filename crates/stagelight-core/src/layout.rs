//! Stage geometry: the single source of truth for where the stage sits on a canvas.
//!
//! Both the renderer and the hit-tester resolve the stage rectangle through
//! [`resolve_stage`] for every frame and every pointer event. Nothing here is cached,
//! since the canvas can be resized between two renders.

use crate::fixtures::FixtureTypeDef;
use crate::scene::{SceneElement, sanitize_scale};
use kurbo::{Point, Rect, Size};

/// Horizontal stage margin, as a fraction of canvas width (per side).
pub const STAGE_MARGIN_FRACTION: f64 = 0.1;
/// Top edge of the stage, as a fraction of canvas height.
pub const STAGE_TOP_FRACTION: f64 = 0.15;
/// Stage height, as a fraction of canvas height.
pub const STAGE_HEIGHT_FRACTION: f64 = 0.6;
/// Gap between the stage and the platform strip, in pixels.
pub const PLATFORM_GAP: f64 = 6.0;
/// Platform strip height, as a fraction of canvas height.
pub const PLATFORM_HEIGHT_FRACTION: f64 = 0.08;
/// Height of the legend strip above the stage, in pixels.
pub const LEGEND_BAND_HEIGHT: f64 = 28.0;
/// Minimum free space kept around the legend strip, in pixels.
pub const LEGEND_PADDING: f64 = 4.0;

/// Lower bound for stored normalized coordinates.
pub const MIN_NORMALIZED: f64 = 0.02;
/// Upper bound for stored normalized coordinates.
pub const MAX_NORMALIZED: f64 = 0.98;

/// Pixel-space stage rectangle derived from a canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRect {
    /// Canvas size the rectangle was resolved for.
    pub canvas: Size,
    /// Left (and right) margin between canvas edge and stage.
    pub margin_x: f64,
    /// Top edge of the stage.
    pub top: f64,
    /// Stage width.
    pub width: f64,
    /// Stage height.
    pub height: f64,
}

/// Compute the stage rectangle for a canvas of the given logical size.
pub fn resolve_stage(canvas_width: f64, canvas_height: f64) -> StageRect {
    let canvas_width = canvas_width.max(0.0);
    let canvas_height = canvas_height.max(0.0);
    let margin_x = canvas_width * STAGE_MARGIN_FRACTION;
    StageRect {
        canvas: Size::new(canvas_width, canvas_height),
        margin_x,
        top: canvas_height * STAGE_TOP_FRACTION,
        width: canvas_width - margin_x * 2.0,
        height: canvas_height * STAGE_HEIGHT_FRACTION,
    }
}

/// Map normalized stage coordinates to canvas pixels.
pub fn normalized_to_pixel(stage: &StageRect, norm_x: f64, norm_y: f64) -> Point {
    stage.normalized_to_pixel(Point::new(norm_x, norm_y))
}

/// Map canvas pixels to normalized stage coordinates.
pub fn pixel_to_normalized(stage: &StageRect, px: f64, py: f64) -> Point {
    stage.pixel_to_normalized(Point::new(px, py))
}

/// Clamp a normalized coordinate into the storable range.
///
/// Non-finite input lands in the middle of the stage.
pub fn clamp_normalized(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.5;
    }
    value.clamp(MIN_NORMALIZED, MAX_NORMALIZED)
}

/// Clamp both axes of a normalized point.
pub fn clamp_normalized_point(point: Point) -> Point {
    Point::new(clamp_normalized(point.x), clamp_normalized(point.y))
}

impl StageRect {
    /// The stage as a kurbo rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.margin_x,
            self.top,
            self.margin_x + self.width,
            self.top + self.height,
        )
    }

    /// The platform strip drawn below the stage.
    pub fn platform(&self) -> Rect {
        let x0 = self.margin_x * 0.5;
        let y0 = self.top + self.height + PLATFORM_GAP;
        Rect::new(
            x0,
            y0,
            x0 + self.canvas.width - self.margin_x,
            y0 + self.canvas.height * PLATFORM_HEIGHT_FRACTION,
        )
    }

    /// The legend strip above the stage, if the canvas leaves room for it.
    pub fn legend_band(&self) -> Option<Rect> {
        let available = self.top;
        if available < LEGEND_BAND_HEIGHT + LEGEND_PADDING * 2.0 || self.width <= 0.0 {
            return None;
        }
        let y0 = (available - LEGEND_BAND_HEIGHT) / 2.0;
        Some(Rect::new(
            self.margin_x,
            y0,
            self.margin_x + self.width,
            y0 + LEGEND_BAND_HEIGHT,
        ))
    }

    /// Map a normalized position to canvas pixels.
    pub fn normalized_to_pixel(&self, norm: Point) -> Point {
        Point::new(
            self.margin_x + norm.x * self.width,
            self.top + norm.y * self.height,
        )
    }

    /// Map canvas pixels to a normalized position (not clamped).
    ///
    /// A degenerate stage axis maps to the middle of that axis.
    pub fn pixel_to_normalized(&self, pixel: Point) -> Point {
        let x = if self.width > 0.0 {
            (pixel.x - self.margin_x) / self.width
        } else {
            0.5
        };
        let y = if self.height > 0.0 {
            (pixel.y - self.top) / self.height
        } else {
            0.5
        };
        Point::new(x, y)
    }
}

/// Screen-space bounding box of a fixture body: centered on its resolved
/// position, sized nominal * sanitized scale (the size the body is drawn at).
pub fn fixture_bounds(stage: &StageRect, element: &SceneElement, def: &FixtureTypeDef) -> Rect {
    let center = stage.normalized_to_pixel(element.position());
    Rect::from_center_size(center, def.scaled_size(sanitize_scale(element.scale)))
}
