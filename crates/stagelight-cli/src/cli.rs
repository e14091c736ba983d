//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use kurbo::Point;
use stagelight_core::paint::Rgb;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stagelight", version, about = "Stage-lighting layout editor")]
pub struct Cli {
    /// Directory holding the project store.
    #[arg(long, env = "STAGELIGHT_STORE_DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available fixture types.
    Types,
    /// List projects.
    List,
    /// Show the fixtures placed in a project.
    Show(ProjectArg),
    /// Create a project and make it current.
    New {
        name: String,
    },
    /// Rename a project.
    Rename {
        /// Project id or name.
        project: String,
        name: String,
    },
    /// Delete a project (the last one cannot be deleted).
    Delete {
        /// Project id or name.
        project: String,
    },
    /// Add a fixture at the middle of the stage.
    Add(AddArgs),
    /// Change a fixture's position, scale or color.
    Set(SetArgs),
    /// Duplicate a fixture.
    Duplicate(ElementArgs),
    /// Remove a fixture.
    Remove(ElementArgs),
    /// Drag on the canvas as a pointer would, from one pixel to another.
    Drag(DragArgs),
    /// Render a project to PNG.
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub struct ProjectArg {
    /// Project id or name (defaults to the most recent project).
    #[arg(long, short)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Fixture type id (see `stagelight types`).
    pub type_id: String,

    #[command(flatten)]
    pub project: ProjectArg,

    /// Normalized position as `x,y`.
    #[arg(long, value_parser = parse_point)]
    pub at: Option<Point>,

    #[arg(long)]
    pub scale: Option<f64>,

    /// Color as `#rrggbb`.
    #[arg(long)]
    pub color: Option<Rgb>,
}

#[derive(Args, Debug)]
pub struct ElementArgs {
    /// 1-based position in the project, or an id prefix.
    pub element: String,

    #[command(flatten)]
    pub project: ProjectArg,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: ElementArgs,

    /// Normalized position as `x,y`.
    #[arg(long, value_parser = parse_point)]
    pub at: Option<Point>,

    #[arg(long)]
    pub scale: Option<f64>,

    /// Color as `#rrggbb`.
    #[arg(long)]
    pub color: Option<Rgb>,
}

#[derive(Args, Debug)]
pub struct DragArgs {
    /// Pointer-down position in canvas pixels, `x,y`.
    #[arg(long, value_parser = parse_point)]
    pub from: Point,

    /// Pointer-up position in canvas pixels, `x,y`.
    #[arg(long, value_parser = parse_point)]
    pub to: Point,

    #[command(flatten)]
    pub canvas: CanvasArgs,

    #[command(flatten)]
    pub project: ProjectArg,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct CanvasArgs {
    /// Canvas width in logical pixels.
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Canvas height in logical pixels.
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output PNG path.
    #[arg(long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub canvas: CanvasArgs,

    /// Resolution multiplier.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Leave out the fixture legend.
    #[arg(long, default_value_t = false)]
    pub no_legend: bool,

    #[command(flatten)]
    pub project: ProjectArg,
}

/// Parse `x,y` into a point.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got '{s}'"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}
