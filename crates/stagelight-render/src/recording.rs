//! A surface that records resolved draw commands instead of rasterizing.

use crate::surface::{Blend, StateStack, StrokeStyle, Surface};
use kurbo::{Affine, BezPath, Rect, Shape};
use stagelight_core::paint::Paint;

/// One recorded fill or stroke, with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Path in local space.
    pub path: BezPath,
    /// Paint with the global alpha already applied.
    pub paint: Paint,
    /// Local-to-device transform.
    pub transform: Affine,
    pub blend: Blend,
    /// `None` for fills.
    pub stroke: Option<StrokeStyle>,
}

impl DrawCommand {
    /// Device-space bounding box of the path (stroke width not included).
    pub fn device_bounds(&self) -> Rect {
        self.transform.transform_rect_bbox(self.path.bounding_box())
    }

    pub fn is_stroke(&self) -> bool {
        self.stroke.is_some()
    }
}

/// Surface that keeps every command for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: StateStack,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Whether every `save` was matched by a `restore`.
    pub fn is_balanced(&self) -> bool {
        self.state.depth() == 0
    }

    fn record(&mut self, path: &BezPath, paint: &Paint, stroke: Option<StrokeStyle>) {
        let state = self.state.current();
        self.commands.push(DrawCommand {
            path: path.clone(),
            paint: self.state.resolve(paint),
            transform: state.transform,
            blend: state.blend,
            stroke,
        });
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn transform(&mut self, affine: Affine) {
        self.state.concat(affine);
    }

    fn set_blend(&mut self, blend: Blend) {
        self.state.set_blend(blend);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.set_alpha(alpha);
    }

    fn fill(&mut self, path: &BezPath, paint: &Paint) {
        self.record(path, paint, None);
    }

    fn stroke(&mut self, path: &BezPath, paint: &Paint, style: &StrokeStyle) {
        self.record(path, paint, Some(style.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;
    use stagelight_core::paint::Rgb;

    #[test]
    fn test_records_state_per_command() {
        let mut surface = RecordingSurface::new();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        surface.save();
        surface.translate(Vec2::new(5.0, 5.0));
        surface.set_blend(Blend::Additive);
        surface.fill_shape(&rect, &Paint::from(Rgb::WHITE));
        surface.restore();
        surface.stroke_shape(&rect, &Paint::from(Rgb::BLACK), &StrokeStyle::new(1.0));

        let commands = surface.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].blend, Blend::Additive);
        assert_eq!(commands[0].device_bounds(), Rect::new(5.0, 5.0, 15.0, 15.0));
        assert!(!commands[0].is_stroke());
        assert_eq!(commands[1].blend, Blend::Normal);
        assert!(commands[1].is_stroke());
        assert!(surface.is_balanced());
    }
}
