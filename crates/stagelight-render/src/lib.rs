//! Stagelight Render Library
//!
//! Drawing-surface abstraction and the scene renderer shared by the live canvas,
//! PNG export and legend icons. Export rasterizes on the CPU with `vello_cpu`;
//! the live canvas can encode into a Vello scene.

mod cpu_impl;
mod export;
mod recording;
mod renderer;
mod surface;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use cpu_impl::{
    CpuSurface, RasterImage, encode_png, render_to_image, render_to_image_with, render_to_raster,
};
pub use export::{ExportOptions, export_frame};
pub use recording::{DrawCommand, RecordingSurface};
pub use renderer::{
    LegendEntry, RenderContext, RenderError, RenderResult, VisualMode, draw_element,
    draw_fixture_icon, draw_visual, legend_entries, legend_layout, render_frame,
    selection_outline,
};
pub use surface::{Blend, DrawState, StateStack, StrokeStyle, Surface};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloSurface;
