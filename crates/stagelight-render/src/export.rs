//! Static export: the live render routine with selection suppressed.

use crate::renderer::{RenderContext, RenderError, RenderResult, render_frame};
use crate::surface::Surface;
use kurbo::Size;
use stagelight_core::scene::{Project, sanitize_scale};

/// Export configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Resolution multiplier (2.0 renders a 2x image of the same layout).
    pub scale: f64,
    pub show_legend: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            show_legend: true,
        }
    }
}

impl ExportOptions {
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    /// Device pixel size for a logical canvas size. Fails when either side is
    /// zero or does not fit a 16-bit raster.
    pub fn pixel_size(&self, width: u32, height: u32) -> RenderResult<(u16, u16)> {
        let scale = sanitize_scale(self.scale);
        let device = |logical: u32| (logical as f64 * scale).round();
        let (w, h) = (device(width), device(height));
        if w < 1.0 || h < 1.0 || w > u16::MAX as f64 || h > u16::MAX as f64 {
            return Err(RenderError::InvalidSize {
                width: w as u32,
                height: h as u32,
            });
        }
        Ok((w as u16, h as u16))
    }
}

/// Paint the export frame of `project` onto `surface`.
///
/// The surface is expected to be `width * scale` by `height * scale` device pixels.
pub fn export_frame<S: Surface>(
    surface: &mut S,
    project: &Project,
    width: u32,
    height: u32,
    options: &ExportOptions,
) {
    let ctx = RenderContext::new(project, Size::new(width as f64, height as f64))
        .with_scale_factor(sanitize_scale(options.scale))
        .with_legend(options.show_legend)
        .with_selection(None);
    render_frame(surface, &ctx);
}
