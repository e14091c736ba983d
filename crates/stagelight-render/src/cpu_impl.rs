//! CPU raster surface backed by `vello_cpu`, and PNG export on top of it.

use crate::export::{ExportOptions, export_frame};
use crate::renderer::{RenderError, RenderResult};
use crate::surface::{Blend, StateStack, StrokeStyle, Surface};
use kurbo::{Affine, BezPath, PathEl};
use stagelight_core::paint::{GradientStop, Paint, Rgba};
use stagelight_core::scene::Project;
use vello_cpu::peniko::color::{AlphaColor, Srgb};
use vello_cpu::peniko::{BlendMode, ColorStop, Compose, Gradient, Mix};

/// Unpremultiplied RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel, row-major).
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// RGBA of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba_data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Surface that rasterizes on the CPU.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    state: StateStack,
    width: u16,
    height: u16,
}

impl CpuSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            state: StateStack::default(),
            width,
            height,
        }
    }

    /// Rasterize everything drawn so far into unpremultiplied RGBA.
    pub fn finish(mut self) -> RasterImage {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut rgba_data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_in_place(&mut rgba_data);
        RasterImage {
            rgba_data,
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    fn prepare(&mut self, paint: &Paint) {
        let state = self.state.current();
        self.ctx.set_transform(affine_to_cpu(state.transform));
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match self.state.resolve(paint) {
            Paint::Solid(color) => self.ctx.set_paint(color_to_cpu(color)),
            Paint::Linear { start, end, stops } => self.ctx.set_paint(
                Gradient::new_linear(point_to_cpu(start), point_to_cpu(end))
                    .with_stops(stops_to_cpu(&stops).as_slice()),
            ),
            Paint::Radial {
                center,
                radius,
                stops,
            } => self.ctx.set_paint(
                Gradient::new_radial(point_to_cpu(center), radius as f32)
                    .with_stops(stops_to_cpu(&stops).as_slice()),
            ),
        }
    }

    fn draw(&mut self, paint: &Paint, draw: impl FnOnce(&mut vello_cpu::RenderContext)) {
        self.prepare(paint);
        let additive = self.state.current().blend == Blend::Additive;
        if additive {
            self.ctx.push_blend_layer(BlendMode::new(Mix::Normal, Compose::Plus));
        }
        draw(&mut self.ctx);
        if additive {
            self.ctx.pop_layer();
        }
    }
}

impl Surface for CpuSurface {
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
        let path = bezpath_to_cpu(path);
        self.draw(paint, |ctx| ctx.fill_path(&path));
    }

    fn stroke(&mut self, path: &BezPath, paint: &Paint, style: &StrokeStyle) {
        let path = bezpath_to_cpu(path);
        let stroke = stroke_to_cpu(style);
        self.draw(paint, |ctx| {
            ctx.set_stroke(stroke);
            ctx.stroke_path(&path);
        });
    }
}

/// Render a project to unpremultiplied RGBA at `width x height` logical pixels.
pub fn render_to_raster(
    project: &Project,
    width: u32,
    height: u32,
    options: &ExportOptions,
) -> RenderResult<RasterImage> {
    let (device_width, device_height) = options.pixel_size(width, height)?;
    log::debug!(
        "Rasterizing \"{}\" at {}x{} ({} element(s))",
        project.name,
        device_width,
        device_height,
        project.len()
    );
    let mut surface = CpuSurface::new(device_width, device_height);
    export_frame(&mut surface, project, width, height, options);
    Ok(surface.finish())
}

/// Render a project to PNG bytes with default export options.
pub fn render_to_image(project: &Project, width: u32, height: u32) -> RenderResult<Vec<u8>> {
    render_to_image_with(project, width, height, &ExportOptions::default())
}

/// Render a project to PNG bytes.
pub fn render_to_image_with(
    project: &Project,
    width: u32,
    height: u32,
    options: &ExportOptions,
) -> RenderResult<Vec<u8>> {
    let raster = render_to_raster(project, width, height, options)?;
    encode_png(&raster)
}

/// Encode RGBA pixels as an 8-bit PNG.
pub fn encode_png(image: &RasterImage) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        writer
            .write_image_data(&image.rgba_data)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn color_to_cpu(color: Rgba) -> AlphaColor<Srgb> {
    AlphaColor::from_rgba8(color.r, color.g, color.b, color.alpha_u8())
}

fn stops_to_cpu(stops: &[GradientStop]) -> Vec<ColorStop> {
    stops
        .iter()
        .map(|stop| ColorStop::from((stop.offset, color_to_cpu(stop.color))))
        .collect()
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn stroke_to_cpu(style: &StrokeStyle) -> vello_cpu::kurbo::Stroke {
    let stroke = vello_cpu::kurbo::Stroke::new(style.width);
    if style.is_dashed() {
        stroke.with_dashes(0.0, style.dashes.iter().copied())
    } else {
        stroke
    }
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3))
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
