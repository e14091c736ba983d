//! Scene renderer: one routine for the live canvas, exports and legend icons.

use crate::surface::{Blend, StrokeStyle, Surface};
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Size};
use stagelight_core::beam::{GLOW_ALPHA, VisualSpec, compute_visual};
use stagelight_core::fixtures::FixtureTypeDef;
use stagelight_core::layout::{LEGEND_PADDING, StageRect, fixture_bounds, resolve_stage};
use stagelight_core::paint::{GradientStop, Paint, Rgb, Rgba};
use stagelight_core::scene::{ElementId, Project, SceneElement};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

const BACKGROUND_EDGE: Rgb = Rgb::from_u32(0x020617);
const BACKGROUND_MID: Rgb = Rgb::from_u32(0x111827);
const STAGE_FILL: Rgb = Rgb::from_u32(0x020617);
const PLATFORM_FILL: Rgb = Rgb::from_u32(0x020617);
const GRID_COLOR: Rgba = Rgba::new(148, 163, 184, 0.2);
const STAGE_BORDER_COLOR: Rgba = Rgba::new(148, 163, 184, 0.45);

/// Grid rows inside the stage rectangle.
pub const GRID_ROWS: usize = 6;
/// Grid columns inside the stage rectangle.
pub const GRID_COLUMNS: usize = 10;
const GRID_LINE_WIDTH: f64 = 0.5;
const STAGE_BORDER_WIDTH: f64 = 1.0;

/// Selection outline.
pub const SELECTION_COLOR: Rgb = Rgb::from_u32(0xe5e7eb);
pub const SELECTION_WIDTH: f64 = 2.0;
pub const SELECTION_DASHES: [f64; 2] = [4.0, 3.0];
/// Distance between the fixture bounds and the selection outline.
pub const SELECTION_OFFSET: f64 = 6.0;

const LEGEND_FILL: Rgba = Rgba::new(15, 23, 42, 0.85);
const LEGEND_PILL_FILL: Rgba = Rgba::new(30, 41, 59, 0.95);
const LEGEND_SWATCH_SIZE: f64 = 10.0;

/// Context for a single render frame.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// The project to render.
    pub project: &'a Project,
    /// Canvas size in logical pixels.
    pub canvas_size: Size,
    /// Device pixel ratio (for HiDPI and scaled exports).
    pub scale_factor: f64,
    /// Element to outline as selected.
    pub selection: Option<ElementId>,
    /// Whether to draw the legend band above the stage.
    pub show_legend: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(project: &'a Project, canvas_size: Size) -> Self {
        Self {
            project,
            canvas_size,
            scale_factor: 1.0,
            selection: None,
            show_legend: true,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the selected element.
    pub fn with_selection(mut self, selection: Option<ElementId>) -> Self {
        self.selection = selection;
        self
    }

    /// Show or hide the legend band.
    pub fn with_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    /// Stage rectangle for this frame's canvas size.
    pub fn stage(&self) -> StageRect {
        resolve_stage(self.canvas_size.width, self.canvas_size.height)
    }
}

/// How much of a fixture visual to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualMode {
    /// Full fixture on the stage; beams are `reach` long.
    Stage { reach: f64 },
    /// Body and lens only, for miniature icons.
    Icon,
}

/// Paint one full frame.
pub fn render_frame<S: Surface>(surface: &mut S, ctx: &RenderContext) {
    let stage = ctx.stage();

    surface.save();
    surface.transform(Affine::scale(ctx.scale_factor));

    draw_backdrop(surface, &stage);
    for element in &ctx.project.elements {
        draw_element(surface, &stage, element, ctx.selection == Some(element.id));
    }
    if ctx.show_legend {
        draw_legend(surface, &stage, ctx.project);
    }

    surface.restore();
}

/// Background gradient, stage, grid, border and platform.
fn draw_backdrop<S: Surface>(surface: &mut S, stage: &StageRect) {
    let canvas = Rect::from_origin_size(Point::ZERO, stage.canvas);
    surface.fill_shape(
        &canvas,
        &Paint::Linear {
            start: Point::ZERO,
            end: Point::new(0.0, stage.canvas.height),
            stops: vec![
                GradientStop::new(0.0, BACKGROUND_EDGE.opaque()),
                GradientStop::new(0.5, BACKGROUND_MID.opaque()),
                GradientStop::new(1.0, BACKGROUND_EDGE.opaque()),
            ],
        },
    );

    let rect = stage.rect();
    surface.fill_shape(&rect, &STAGE_FILL.into());

    let mut grid = BezPath::new();
    for row in 0..=GRID_ROWS {
        let y = rect.y0 + rect.height() * row as f64 / GRID_ROWS as f64;
        grid.move_to(Point::new(rect.x0, y));
        grid.line_to(Point::new(rect.x1, y));
    }
    for column in 0..=GRID_COLUMNS {
        let x = rect.x0 + rect.width() * column as f64 / GRID_COLUMNS as f64;
        grid.move_to(Point::new(x, rect.y0));
        grid.line_to(Point::new(x, rect.y1));
    }
    surface.stroke(&grid, &GRID_COLOR.into(), &StrokeStyle::new(GRID_LINE_WIDTH));
    surface.stroke_shape(&rect, &STAGE_BORDER_COLOR.into(), &StrokeStyle::new(STAGE_BORDER_WIDTH));

    surface.fill_shape(&stage.platform(), &PLATFORM_FILL.into());
}

/// Draw one element at its stage position. Unknown types draw nothing.
pub fn draw_element<S: Surface>(
    surface: &mut S,
    stage: &StageRect,
    element: &SceneElement,
    selected: bool,
) {
    let Some(def) = element.fixture_type() else {
        return;
    };
    let Some(visual) = compute_visual(&element.type_id, element.scale, element.color) else {
        return;
    };
    let center = stage.normalized_to_pixel(element.position());

    surface.save();
    surface.translate(center.to_vec2());
    draw_visual(surface, &visual, VisualMode::Stage { reach: stage.height });
    surface.restore();

    if selected {
        draw_selection_outline(surface, fixture_bounds(stage, element, def));
    }
}

/// Paint a fixture visual around the current origin.
pub fn draw_visual<S: Surface>(surface: &mut S, visual: &VisualSpec, mode: VisualMode) {
    let reach = match mode {
        VisualMode::Stage { reach } => reach,
        VisualMode::Icon => 0.0,
    };
    let layers = visual.layers(reach);

    if let VisualMode::Stage { .. } = mode {
        surface.save();
        surface.set_blend(Blend::Additive);
        for layer in &layers.beam {
            surface.fill(&layer.path, &layer.paint);
        }
        surface.restore();
    }

    for layer in &layers.body {
        surface.fill(&layer.path, &layer.paint);
    }

    if let VisualMode::Stage { .. } = mode {
        surface.save();
        surface.set_alpha(GLOW_ALPHA);
        surface.fill(&layers.glow.path, &layers.glow.paint);
        surface.restore();
    }
}

/// The outline drawn around a selected fixture's bounds.
pub fn selection_outline(bounds: Rect) -> Rect {
    bounds.inflate(SELECTION_OFFSET, SELECTION_OFFSET)
}

fn draw_selection_outline<S: Surface>(surface: &mut S, bounds: Rect) {
    let style = StrokeStyle::new(SELECTION_WIDTH).with_dashes(&SELECTION_DASHES);
    surface.stroke_shape(&selection_outline(bounds), &SELECTION_COLOR.into(), &style);
}

/// Draw a fixture type as a miniature that fits inside `frame`.
pub fn draw_fixture_icon<S: Surface>(
    surface: &mut S,
    def: &FixtureTypeDef,
    color: Rgb,
    frame: Rect,
) {
    let Some(visual) = compute_visual(def.id, 1.0, color) else {
        return;
    };
    let extent = visual.housing.rect();
    if extent.width() <= 0.0 || extent.height() <= 0.0 {
        return;
    }
    let icon_scale = (frame.width() / extent.width()).min(frame.height() / extent.height());

    surface.save();
    surface.translate(frame.center().to_vec2());
    surface.transform(Affine::scale(icon_scale));
    draw_visual(surface, &visual, VisualMode::Icon);
    surface.restore();
}

/// One legend entry: a fixture type present in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub def: &'static FixtureTypeDef,
    /// Color of the first element of this type.
    pub color: Rgb,
    pub count: usize,
}

/// Distinct known fixture types in first-appearance order.
pub fn legend_entries(project: &Project) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = Vec::new();
    for element in &project.elements {
        let Some(def) = element.fixture_type() else {
            continue;
        };
        match entries.iter_mut().find(|e| e.def.id == def.id) {
            Some(entry) => entry.count += 1,
            None => entries.push(LegendEntry {
                def,
                color: element.color,
                count: 1,
            }),
        }
    }
    entries
}

/// Pill rectangles for the legend, left to right until the band is full.
pub fn legend_layout(band: Rect, entries: usize) -> Vec<Rect> {
    let pill_height = band.height() - LEGEND_PADDING * 2.0;
    if pill_height <= 0.0 {
        return Vec::new();
    }
    // Icon box (square), swatch, and padding around and between them.
    let pill_width = pill_height + LEGEND_SWATCH_SIZE + LEGEND_PADDING * 3.0;

    let mut pills = Vec::with_capacity(entries);
    let mut x = band.x0 + LEGEND_PADDING;
    for _ in 0..entries {
        if x + pill_width > band.x1 - LEGEND_PADDING {
            break;
        }
        let y = band.y0 + LEGEND_PADDING;
        pills.push(Rect::new(x, y, x + pill_width, y + pill_height));
        x += pill_width + LEGEND_PADDING;
    }
    pills
}

fn draw_legend<S: Surface>(surface: &mut S, stage: &StageRect, project: &Project) {
    let Some(band) = stage.legend_band() else {
        return;
    };
    let entries = legend_entries(project);
    if entries.is_empty() {
        return;
    }

    let radius = band.height() / 2.0;
    surface.fill_shape(&RoundedRect::from_rect(band, radius), &LEGEND_FILL.into());

    let pills = legend_layout(band, entries.len());
    if pills.len() < entries.len() {
        log::debug!("Legend shows {} of {} fixture types", pills.len(), entries.len());
    }
    for (entry, pill) in entries.iter().zip(pills) {
        surface.fill_shape(
            &RoundedRect::from_rect(pill, pill.height() / 2.0),
            &LEGEND_PILL_FILL.into(),
        );

        let icon = Rect::new(
            pill.x0 + LEGEND_PADDING,
            pill.y0,
            pill.x0 + LEGEND_PADDING + pill.height(),
            pill.y1,
        )
        .inset(-1.0);
        draw_fixture_icon(surface, entry.def, entry.color, icon);

        let swatch = Rect::from_center_size(
            Point::new(pill.x1 - LEGEND_PADDING - LEGEND_SWATCH_SIZE / 2.0, pill.center().y),
            Size::new(LEGEND_SWATCH_SIZE, LEGEND_SWATCH_SIZE),
        );
        let dot = kurbo::Circle::new(swatch.center(), swatch.width() / 2.0);
        surface.fill_shape(&dot, &entry.color.into());
    }
}
