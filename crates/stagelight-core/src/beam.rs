//! Beam template engine.
//!
//! Each fixture type has a hand-tuned visual signature, kept as a row in
//! [`BEAM_TEMPLATES`]. [`compute_visual`] turns a row plus an instance's scale and
//! color into a [`VisualSpec`] drawn around a local origin at the fixture's center,
//! with the beam pointing toward +y. [`VisualSpec::layers`] resolves that spec into
//! plain filled paths, so a renderer only needs one generic interpreter and adding a
//! fixture type is a table change.

use crate::fixtures;
use crate::paint::{GradientStop, Paint, Rgb, Rgba};
use crate::scene::sanitize_scale;
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape, Vec2};

/// Tolerance used when flattening curves into paths.
pub const PATH_TOLERANCE: f64 = 0.1;
/// Housing color behind every fixture head.
pub const HOUSING_COLOR: Rgb = Rgb::from_u32(0x0f172a);
/// Housing padding around the body, in pixels.
pub const HOUSING_PADDING: f64 = 4.0;
/// Housing corner radius, in pixels.
pub const HOUSING_RADIUS: f64 = 6.0;
/// Lens window corner radius, in pixels.
pub const WINDOW_RADIUS: f64 = 4.0;
/// Global alpha applied when painting the glow ellipse.
pub const GLOW_ALPHA: f32 = 0.6;
/// Number of LED cells drawn in a bar's window.
pub const BAR_CELLS: u32 = 4;

/// Peak alpha of the haze layer, before intensity.
const HAZE_ALPHA: f32 = 0.25;
/// Peak alpha of the glow gradient.
const GLOW_GRADIENT_ALPHA: f32 = 0.75;

/// Beam silhouette family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamShape {
    /// Trapezoid widening away from the fixture.
    Cone,
    /// Hard-edged beam of constant width.
    Rectangular,
    /// Flat, wide LED wash starting at the full body width.
    Bar,
    /// Soft elliptical pool of light.
    Radial(RadialProfile),
    /// Bright white flash at the head plus a short beam.
    StrobeFlash,
}

/// Radial beam variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialProfile {
    Fresnel,
    Par,
}

/// Three-stop alpha ramp along a beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaRamp {
    pub start: f32,
    pub mid: f32,
    pub end: f32,
}

impl AlphaRamp {
    pub const fn new(start: f32, mid: f32, end: f32) -> Self {
        Self { start, mid, end }
    }

    fn scaled(self, factor: f32) -> Self {
        Self::new(self.start * factor, self.mid * factor, self.end * factor)
    }

    /// Gradient stops at 0, 0.5 and 1 in the given color.
    pub fn stops(self, color: Rgb) -> Vec<GradientStop> {
        vec![
            GradientStop::new(0.0, color.with_alpha(self.start)),
            GradientStop::new(0.5, color.with_alpha(self.mid)),
            GradientStop::new(1.0, color.with_alpha(self.end)),
        ]
    }
}

/// Visual parameters of one fixture type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamTemplate {
    pub type_id: &'static str,
    pub shape: BeamShape,
    /// Beam length as a multiple of the reach.
    pub length: f64,
    /// Beam width at the fixture, as a multiple of body width.
    pub near_width: f64,
    /// Beam width at the far end, as a multiple of body width.
    pub far_width: f64,
    /// Radial pool radii as multiples of body width and body height.
    pub radial_radii: (f64, f64),
    /// Alpha ramp before intensity is applied.
    pub ramp: AlphaRamp,
    /// Overall brightness in [0, 1].
    pub intensity: f32,
}

/// Per-type visual table.
pub static BEAM_TEMPLATES: [BeamTemplate; 8] = [
    BeamTemplate {
        type_id: "spot",
        shape: BeamShape::Cone,
        length: 0.45,
        near_width: 0.6,
        far_width: 1.5,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(0.95, 0.5, 0.0),
        intensity: 0.9,
    },
    BeamTemplate {
        type_id: "wash",
        shape: BeamShape::Cone,
        length: 0.50,
        near_width: 1.2,
        far_width: 2.4,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(0.75, 0.35, 0.0),
        intensity: 0.8,
    },
    BeamTemplate {
        type_id: "beam",
        shape: BeamShape::Cone,
        length: 0.70,
        near_width: 0.25,
        far_width: 0.9,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(1.0, 0.5, 0.05),
        intensity: 1.0,
    },
    BeamTemplate {
        type_id: "bar",
        shape: BeamShape::Bar,
        length: 0.35,
        near_width: 1.0,
        far_width: 1.5,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(0.8, 0.4, 0.0),
        intensity: 0.85,
    },
    BeamTemplate {
        type_id: "profile",
        shape: BeamShape::Rectangular,
        length: 0.55,
        near_width: 1.1,
        far_width: 1.1,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(0.95, 0.6, 0.15),
        intensity: 0.9,
    },
    BeamTemplate {
        type_id: "fresnel",
        shape: BeamShape::Radial(RadialProfile::Fresnel),
        length: 0.0,
        near_width: 0.0,
        far_width: 0.0,
        radial_radii: (1.5, 2.2),
        ramp: AlphaRamp::new(0.8, 0.45, 0.0),
        intensity: 0.75,
    },
    BeamTemplate {
        type_id: "par",
        shape: BeamShape::Radial(RadialProfile::Par),
        length: 0.0,
        near_width: 0.0,
        far_width: 0.0,
        radial_radii: (1.3, 1.6),
        ramp: AlphaRamp::new(0.9, 0.45, 0.0),
        intensity: 0.9,
    },
    BeamTemplate {
        type_id: "strobe",
        shape: BeamShape::StrobeFlash,
        length: 0.45,
        near_width: 0.7,
        far_width: 1.6,
        radial_radii: (0.0, 0.0),
        ramp: AlphaRamp::new(0.9, 0.45, 0.0),
        intensity: 1.0,
    },
];

/// Look up the visual template for a fixture type.
pub fn template_for(type_id: &str) -> Option<&'static BeamTemplate> {
    BEAM_TEMPLATES.iter().find(|t| t.type_id == type_id)
}

/// Head glyph drawn on top of the fixture body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LensGlyph {
    /// Rectangular window, optionally split into LED cells.
    Window { rect: RoundedRect, cells: u32 },
    /// Round lens with a radial highlight.
    Circle(Circle),
}

/// Declarative description of one fixture's appearance around a local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSpec {
    pub template: &'static BeamTemplate,
    pub color: Rgb,
    pub scale: f64,
    /// Body rectangle (nominal size * scale) centered on the origin.
    pub body: Rect,
    pub housing: RoundedRect,
    pub lens: LensGlyph,
    /// Glow ellipse beneath the body.
    pub glow: Ellipse,
    /// Alpha ramp with intensity already applied.
    pub ramp: AlphaRamp,
}

/// A filled path with its paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub path: BezPath,
    pub paint: Paint,
}

impl Layer {
    fn new(shape: &impl Shape, paint: impl Into<Paint>) -> Self {
        Self {
            path: shape.to_path(PATH_TOLERANCE),
            paint: paint.into(),
        }
    }
}

/// Resolved paint layers for one fixture, in paint order within each group.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLayers {
    /// Beam and haze, painted with additive blending.
    pub beam: Vec<Layer>,
    /// Housing, body and lens, painted opaque.
    pub body: Vec<Layer>,
    /// Glow ellipse, painted at [`GLOW_ALPHA`].
    pub glow: Layer,
}

/// Build the visual description of an instance. Returns `None` for unknown types.
pub fn compute_visual(type_id: &str, scale: f64, color: Rgb) -> Option<VisualSpec> {
    let def = fixtures::lookup(type_id)?;
    let template = template_for(type_id)?;
    let scale = sanitize_scale(scale);
    let size = def.scaled_size(scale);
    let body = Rect::from_center_size(Point::ZERO, size);

    let lens = match template.shape {
        BeamShape::Rectangular | BeamShape::Bar => LensGlyph::Window {
            rect: RoundedRect::from_rect(body, WINDOW_RADIUS),
            cells: if template.shape == BeamShape::Bar { BAR_CELLS } else { 1 },
        },
        _ => LensGlyph::Circle(Circle::new(
            Point::ZERO,
            size.width.min(size.height) * 0.4,
        )),
    };

    Some(VisualSpec {
        template,
        color,
        scale,
        body,
        housing: RoundedRect::from_rect(
            body.inflate(HOUSING_PADDING, HOUSING_PADDING),
            HOUSING_RADIUS,
        ),
        lens,
        glow: Ellipse::new(
            Point::new(0.0, size.height),
            Vec2::new(size.width * 1.6, size.height * 2.2),
            0.0,
        ),
        ramp: template.ramp.scaled(template.intensity),
    })
}

impl VisualSpec {
    pub fn shape(&self) -> BeamShape {
        self.template.shape
    }

    /// Beam length in pixels for a given reach (the stage height for live frames).
    pub fn beam_length(&self, reach: f64) -> f64 {
        self.template.length * reach * self.scale
    }

    /// Beam width at the fixture, in pixels.
    pub fn near_width(&self) -> f64 {
        self.template.near_width * self.body.width()
    }

    /// Beam width at the far end, in pixels.
    pub fn far_width(&self) -> f64 {
        self.template.far_width * self.body.width()
    }

    /// Radii of the radial pool, in pixels.
    pub fn radial_radii(&self) -> Vec2 {
        let (fw, fh) = self.template.radial_radii;
        Vec2::new(fw * self.body.width(), fh * self.body.height())
    }

    /// Resolve into concrete paint layers.
    pub fn layers(&self, reach: f64) -> VisualLayers {
        VisualLayers {
            beam: self.beam_layers(reach),
            body: self.body_layers(),
            glow: self.glow_layer(),
        }
    }

    fn beam_layers(&self, reach: f64) -> Vec<Layer> {
        let length = self.beam_length(reach).max(0.0);
        let y0 = self.body.y1;
        let y1 = y0 + length;
        let intensity = self.template.intensity;

        match self.template.shape {
            BeamShape::Cone | BeamShape::Bar => {
                let beam = self.trapezoid(y0, y1, self.near_width(), self.far_width());
                vec![self.haze(y0, length, self.far_width()), beam]
            }
            BeamShape::Rectangular => {
                let width = self.far_width();
                let beam = self.trapezoid(y0, y1, width, width);
                vec![self.haze(y0, length, width), beam]
            }
            BeamShape::Radial(_) => {
                let radii = self.radial_radii();
                let center = Point::new(0.0, self.body.height());
                let pool = Ellipse::new(center, radii, 0.0);
                let paint = Paint::Radial {
                    center,
                    radius: radii.x.max(radii.y),
                    stops: self.ramp.stops(self.color),
                };
                vec![Layer::new(&pool, paint)]
            }
            BeamShape::StrobeFlash => {
                let beam = self.trapezoid(y0, y1, self.near_width(), self.far_width());
                let radius = self.body.width().max(self.body.height()) * 1.1;
                let flash = Layer::new(
                    &Circle::new(Point::ZERO, radius),
                    Paint::Radial {
                        center: Point::ZERO,
                        radius,
                        stops: vec![
                            GradientStop::new(0.0, Rgb::WHITE.with_alpha(intensity)),
                            GradientStop::new(0.35, self.color.with_alpha(0.9 * intensity)),
                            GradientStop::new(1.0, self.color.with_alpha(0.0)),
                        ],
                    },
                );
                vec![self.haze(y0, length, self.far_width()), beam, flash]
            }
        }
    }

    fn trapezoid(&self, y0: f64, y1: f64, near: f64, far: f64) -> Layer {
        let mut path = BezPath::new();
        path.move_to(Point::new(-near / 2.0, y0));
        path.line_to(Point::new(near / 2.0, y0));
        path.line_to(Point::new(far / 2.0, y1));
        path.line_to(Point::new(-far / 2.0, y1));
        path.close_path();
        Layer {
            path,
            paint: Paint::Linear {
                start: Point::new(0.0, y0),
                end: Point::new(0.0, y1),
                stops: self.ramp.stops(self.color),
            },
        }
    }

    fn haze(&self, y0: f64, length: f64, width: f64) -> Layer {
        let center = Point::new(0.0, y0 + length * 0.6);
        let radii = Vec2::new(width * 0.9, length * 0.45);
        Layer::new(
            &Ellipse::new(center, radii, 0.0),
            Paint::Radial {
                center,
                radius: radii.x.max(radii.y).max(f64::EPSILON),
                stops: vec![
                    GradientStop::new(
                        0.0,
                        self.color.with_alpha(HAZE_ALPHA * self.template.intensity),
                    ),
                    GradientStop::new(1.0, self.color.with_alpha(0.0)),
                ],
            },
        )
    }

    fn body_layers(&self) -> Vec<Layer> {
        let mut layers = vec![Layer::new(&self.housing, HOUSING_COLOR)];
        match self.lens {
            LensGlyph::Window { rect, cells } => {
                layers.push(Layer::new(&rect, self.color));
                // Thin housing-colored dividers between LED cells.
                let cell_width = self.body.width() / cells.max(1) as f64;
                let divider = (self.body.width() * 0.02).max(1.0);
                for i in 1..cells {
                    let x = self.body.x0 + cell_width * i as f64;
                    let bar = Rect::new(
                        x - divider / 2.0,
                        self.body.y0,
                        x + divider / 2.0,
                        self.body.y1,
                    );
                    layers.push(Layer::new(&bar, HOUSING_COLOR));
                }
            }
            LensGlyph::Circle(circle) => {
                let shell = RoundedRect::from_rect(self.body, WINDOW_RADIUS);
                layers.push(Layer::new(&shell, self.color.mix(HOUSING_COLOR, 0.6)));
                layers.push(Layer::new(
                    &circle,
                    Paint::Radial {
                        center: circle.center,
                        radius: circle.radius,
                        stops: vec![
                            GradientStop::new(0.0, Rgb::WHITE.opaque()),
                            GradientStop::new(0.45, self.color.opaque()),
                            GradientStop::new(1.0, self.color.mix(HOUSING_COLOR, 0.3).opaque()),
                        ],
                    },
                ));
            }
        }
        layers
    }

    fn glow_layer(&self) -> Layer {
        Layer::new(
            &self.glow,
            Paint::Radial {
                center: Point::ZERO,
                radius: self.body.height() * 1.4,
                stops: vec![
                    GradientStop::new(0.0, self.color.with_alpha(GLOW_GRADIENT_ALPHA)),
                    GradientStop::new(1.0, Rgba::TRANSPARENT),
                ],
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(type_id: &str) -> VisualSpec {
        let color = fixtures::lookup(type_id).unwrap().base_color;
        compute_visual(type_id, 1.0, color).unwrap()
    }

    #[test]
    fn test_every_fixture_type_has_a_template() {
        for def in fixtures::all() {
            assert!(template_for(def.id).is_some(), "{}", def.id);
        }
        assert_eq!(BEAM_TEMPLATES.len(), fixtures::FIXTURE_TYPES.len());
    }

    #[test]
    fn test_table_values() {
        let spot = template_for("spot").unwrap();
        assert_eq!(spot.shape, BeamShape::Cone);
        assert_eq!((spot.length, spot.near_width, spot.far_width), (0.45, 0.6, 1.5));
        assert_eq!(spot.ramp, AlphaRamp::new(0.95, 0.5, 0.0));
        assert_eq!(spot.intensity, 0.9);

        let wash = template_for("wash").unwrap();
        assert_eq!((wash.length, wash.near_width, wash.far_width), (0.50, 1.2, 2.4));
        assert_eq!(wash.ramp, AlphaRamp::new(0.75, 0.35, 0.0));
        assert_eq!(wash.intensity, 0.8);

        let beam = template_for("beam").unwrap();
        assert_eq!((beam.length, beam.near_width, beam.far_width), (0.70, 0.25, 0.9));
        assert_eq!(beam.ramp, AlphaRamp::new(1.0, 0.5, 0.05));
        assert_eq!(beam.intensity, 1.0);

        assert_eq!(template_for("bar").unwrap().shape, BeamShape::Bar);
        assert_eq!(template_for("bar").unwrap().intensity, 0.85);

        let profile = template_for("profile").unwrap();
        assert_eq!(profile.shape, BeamShape::Rectangular);
        assert_eq!((profile.length, profile.far_width), (0.55, 1.1));
        assert_eq!(profile.ramp, AlphaRamp::new(0.95, 0.6, 0.15));

        let fresnel = template_for("fresnel").unwrap();
        assert_eq!(fresnel.shape, BeamShape::Radial(RadialProfile::Fresnel));
        assert_eq!(fresnel.radial_radii, (1.5, 2.2));
        assert_eq!(fresnel.ramp, AlphaRamp::new(0.8, 0.45, 0.0));
        assert_eq!(fresnel.intensity, 0.75);

        let par = template_for("par").unwrap();
        assert_eq!(par.shape, BeamShape::Radial(RadialProfile::Par));
        assert_eq!(par.radial_radii, (1.3, 1.6));
        assert_eq!(par.ramp, AlphaRamp::new(0.9, 0.45, 0.0));

        let strobe = template_for("strobe").unwrap();
        assert_eq!(strobe.shape, BeamShape::StrobeFlash);
        assert_eq!((strobe.length, strobe.near_width), (0.45, 0.7));
        assert_eq!(strobe.intensity, 1.0);
    }

    #[test]
    fn test_unknown_type_has_no_visual() {
        assert!(compute_visual("laser", 1.0, Rgb::WHITE).is_none());
    }

    #[test]
    fn test_ramp_is_premultiplied_by_intensity() {
        let wash = spec("wash");
        assert!((wash.ramp.start - 0.75 * 0.8).abs() < 1e-6);
        assert!((wash.ramp.mid - 0.35 * 0.8).abs() < 1e-6);
        assert_eq!(wash.ramp.end, 0.0);
    }

    #[test]
    fn test_body_scales_with_instance() {
        let color = Rgb::WHITE;
        let small = compute_visual("beam", 1.0, color).unwrap();
        let big = compute_visual("beam", 2.0, color).unwrap();
        assert_eq!(small.body, Rect::new(-15.0, -30.0, 15.0, 30.0));
        assert_eq!(big.body, Rect::new(-30.0, -60.0, 30.0, 60.0));
        assert_eq!(big.beam_length(100.0), 2.0 * small.beam_length(100.0));
    }

    #[test]
    fn test_cone_geometry_points_down() {
        let spot = spec("spot");
        let layers = spot.layers(360.0);
        assert_eq!(layers.beam.len(), 2);
        let cone = layers.beam[1].path.bounding_box();
        assert!((cone.y0 - 20.0).abs() < 1e-9);
        assert!((cone.y1 - (20.0 + 0.45 * 360.0)).abs() < 1e-9);
        assert!((cone.width() - 1.5 * 40.0).abs() < 1e-9);
        let Paint::Linear { start, end, stops } = &layers.beam[1].paint else {
            panic!("cone should use a linear gradient");
        };
        assert!(end.y > start.y);
        assert_eq!(stops.len(), 3);
        assert!((stops[0].color.a - 0.95 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_profile_beam_has_constant_width() {
        let profile = spec("profile");
        let layers = profile.layers(200.0);
        let beam = layers.beam[1].path.bounding_box();
        assert!((beam.width() - 36.0 * 1.1).abs() < 1e-9);
        assert!(matches!(profile.lens, LensGlyph::Window { cells: 1, .. }));
    }

    #[test]
    fn test_radial_pool_dimensions() {
        let fresnel = spec("fresnel");
        let layers = fresnel.layers(300.0);
        assert_eq!(layers.beam.len(), 1);
        let pool = layers.beam[0].path.bounding_box();
        assert!((pool.width() - 2.0 * 1.5 * 44.0).abs() < 0.5);
        assert!((pool.height() - 2.0 * 2.2 * 44.0).abs() < 0.5);
    }

    #[test]
    fn test_strobe_has_white_flash() {
        let strobe = spec("strobe");
        let layers = strobe.layers(300.0);
        assert_eq!(layers.beam.len(), 3);
        let Paint::Radial { stops, .. } = &layers.beam[2].paint else {
            panic!("flash should be radial");
        };
        assert_eq!(stops[0].color, Rgb::WHITE.with_alpha(1.0));
        assert_eq!(stops.last().unwrap().color.a, 0.0);
    }

    #[test]
    fn test_lens_glyphs() {
        assert!(matches!(spec("bar").lens, LensGlyph::Window { cells: BAR_CELLS, .. }));
        for id in ["spot", "wash", "beam", "fresnel", "par", "strobe"] {
            assert!(matches!(spec(id).lens, LensGlyph::Circle(_)), "{id}");
        }
        // Housing + window + dividers.
        assert_eq!(spec("bar").layers(100.0).body.len(), 2 + (BAR_CELLS as usize - 1));
    }

    #[test]
    fn test_glow_sits_beneath_body() {
        let par = spec("par");
        assert_eq!(par.glow.center(), Point::new(0.0, 38.0));
        let bounds = par.layers(100.0).glow.path.bounding_box();
        assert!((bounds.width() - 2.0 * 38.0 * 1.6).abs() < 0.5);
        assert!((bounds.height() - 2.0 * 38.0 * 2.2).abs() < 0.5);
    }
}
