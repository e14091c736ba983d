//! Vello scene surface for the live GPU canvas.

use crate::surface::{Blend, StateStack, StrokeStyle, Surface};
use kurbo::{Affine, BezPath, Rect};
use stagelight_core::paint::{GradientStop, Paint, Rgba};
use vello::Scene;
use vello::peniko::{BlendMode, Brush, Color, ColorStop, Compose, Fill, Gradient, Mix};

/// Surface that encodes draw commands into a [`vello::Scene`].
pub struct VelloSurface {
    scene: Scene,
    state: StateStack,
    /// Device-space clip used for blend layers.
    viewport: Rect,
}

impl VelloSurface {
    /// Create a surface covering `width x height` device pixels.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scene: Scene::new(),
            state: StateStack::default(),
            viewport: Rect::new(0.0, 0.0, width, height),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Clear the scene for a new frame, keeping the allocation.
    pub fn reset(&mut self, width: f64, height: f64) {
        self.scene.reset();
        self.state = StateStack::default();
        self.viewport = Rect::new(0.0, 0.0, width, height);
    }

    /// Run `draw` with the current transform and brush, inside an additive
    /// layer when the blend mode asks for one.
    fn draw(&mut self, paint: &Paint, draw: impl FnOnce(&mut Scene, Affine, &Brush)) {
        let state = *self.state.current();
        let brush = to_brush(&self.state.resolve(paint));
        let additive = state.blend == Blend::Additive;
        if additive {
            self.scene.push_layer(
                Fill::NonZero,
                BlendMode::new(Mix::Normal, Compose::Plus),
                1.0,
                Affine::IDENTITY,
                &self.viewport,
            );
        }
        draw(&mut self.scene, state.transform, &brush);
        if additive {
            self.scene.pop_layer();
        }
    }
}

impl Surface for VelloSurface {
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
        self.draw(paint, |scene, transform, brush| {
            scene.fill(Fill::NonZero, transform, brush, None, path);
        });
    }

    fn stroke(&mut self, path: &BezPath, paint: &Paint, style: &StrokeStyle) {
        let stroke = style.to_kurbo();
        self.draw(paint, |scene, transform, brush| {
            scene.stroke(&stroke, transform, brush, None, path);
        });
    }
}

fn to_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.alpha_u8())
}

fn to_stops(stops: &[GradientStop]) -> Vec<ColorStop> {
    stops
        .iter()
        .map(|stop| ColorStop::from((stop.offset, to_color(stop.color))))
        .collect()
}

fn to_brush(paint: &Paint) -> Brush {
    match paint {
        Paint::Solid(color) => Brush::Solid(to_color(*color)),
        Paint::Linear { start, end, stops } => Brush::Gradient(
            Gradient::new_linear(*start, *end).with_stops(to_stops(stops).as_slice()),
        ),
        Paint::Radial {
            center,
            radius,
            stops,
        } => Brush::Gradient(
            Gradient::new_radial(*center, *radius as f32)
                .with_stops(to_stops(stops).as_slice()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{RenderContext, render_frame};
    use kurbo::Size;
    use stagelight_core::fixtures;
    use stagelight_core::paint::Rgb;
    use stagelight_core::scene::{Project, SceneElement};

    #[test]
    fn test_surface_creation() {
        let surface = VelloSurface::new(800.0, 600.0);
        assert!(surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_frame_with_fixtures() {
        let mut project = Project::new("Live");
        for def in fixtures::all() {
            project.add_element(SceneElement::new(def));
        }
        let mut surface = VelloSurface::new(800.0, 600.0);
        render_frame(&mut surface, &RenderContext::new(&project, Size::new(800.0, 600.0)));
        assert!(!surface.scene().encoding().is_empty());

        let scene = surface.take_scene();
        assert!(!scene.encoding().is_empty());
        assert!(surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_solid_brush_conversion() {
        let Brush::Solid(color) = to_brush(&Paint::from(Rgb::from_u32(0x38bdf8))) else {
            panic!("expected solid brush");
        };
        assert_eq!(color.to_rgba8().to_u8_array(), [0x38, 0xbd, 0xf8, 0xff]);
    }
}
