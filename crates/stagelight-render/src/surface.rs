//! Drawing surface abstraction.
//!
//! A surface is an immediate-mode 2D target with a save/restore stack, in the
//! spirit of a canvas context. The scene renderer only talks to this trait, so
//! live, export and icon rendering all run the same code.

use kurbo::{Affine, BezPath, Shape, Vec2};
use stagelight_core::beam::PATH_TOLERANCE;
use stagelight_core::paint::Paint;

/// How new pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    /// Source-over.
    #[default]
    Normal,
    /// Source is added to the destination (light accumulation).
    Additive,
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    /// Alternating dash and gap lengths. Empty means a solid line.
    pub dashes: Vec<f64>,
}

impl StrokeStyle {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            dashes: Vec::new(),
        }
    }

    pub fn with_dashes(mut self, dashes: &[f64]) -> Self {
        self.dashes = dashes.to_vec();
        self
    }

    pub fn is_dashed(&self) -> bool {
        !self.dashes.is_empty()
    }

    /// Convert into a kurbo stroke.
    pub fn to_kurbo(&self) -> kurbo::Stroke {
        let stroke = kurbo::Stroke::new(self.width);
        if self.is_dashed() {
            stroke.with_dashes(0.0, self.dashes.iter().copied())
        } else {
            stroke
        }
    }
}

/// Graphics state saved and restored by [`Surface::save`] / [`Surface::restore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub transform: Affine,
    pub blend: Blend,
    /// Global alpha multiplied into every paint.
    pub alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            blend: Blend::Normal,
            alpha: 1.0,
        }
    }
}

/// Save/restore stack shared by the surface implementations.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub fn new(base: Affine) -> Self {
        Self {
            current: DrawState {
                transform: base,
                ..DrawState::default()
            },
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> &DrawState {
        &self.current
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Pop the last saved state. An unbalanced restore is ignored.
    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(state) => self.current = state,
            None => log::warn!("Surface restore without matching save"),
        }
    }

    pub fn concat(&mut self, affine: Affine) {
        self.current.transform *= affine;
    }

    pub fn set_blend(&mut self, blend: Blend) {
        self.current.blend = blend;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.current.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Paint with the global alpha folded in. Degenerate gradients become solid.
    pub fn resolve(&self, paint: &Paint) -> Paint {
        paint.faded(self.current.alpha).or_solid_fallback()
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// A 2D drawing target.
///
/// Paths and paint geometry are given in the current local space; the current
/// transform maps them to device pixels.
pub trait Surface {
    /// Push the graphics state.
    fn save(&mut self);

    /// Pop the graphics state.
    fn restore(&mut self);

    /// Concatenate `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);

    fn translate(&mut self, offset: Vec2) {
        self.transform(Affine::translate(offset));
    }

    fn set_blend(&mut self, blend: Blend);

    /// Set the global alpha, clamped to [0, 1].
    fn set_alpha(&mut self, alpha: f32);

    /// Fill a path (non-zero winding).
    fn fill(&mut self, path: &BezPath, paint: &Paint);

    fn stroke(&mut self, path: &BezPath, paint: &Paint, style: &StrokeStyle);

    /// Fill any kurbo shape.
    fn fill_shape(&mut self, shape: &impl Shape, paint: &Paint)
    where
        Self: Sized,
    {
        self.fill(&shape.to_path(PATH_TOLERANCE), paint);
    }

    /// Stroke any kurbo shape.
    fn stroke_shape(&mut self, shape: &impl Shape, paint: &Paint, style: &StrokeStyle)
    where
        Self: Sized,
    {
        self.stroke(&shape.to_path(PATH_TOLERANCE), paint, style);
    }
}
