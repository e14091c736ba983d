//! Command implementations on top of the editor.

use crate::cli::{AddArgs, Command, DragArgs, ElementArgs, ExportArgs, ProjectArg, SetArgs};
use anyhow::{Context as _, bail};
use kurbo::{Point, Size};
use stagelight_core::Editor;
use stagelight_core::fixtures;
use stagelight_core::interaction::{
    InteractionController, InteractionOutcome, PointerInput, PointerPhase,
};
use stagelight_core::scene::ElementId;
use stagelight_render::{ExportOptions, render_to_image_with};
use std::io::Write;

/// Run one command, writing human-readable output to `out`.
pub fn run(editor: &mut Editor, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Types => list_types(out),
        Command::List => list_projects(editor, out),
        Command::Show(project) => show_project(editor, &project, out),
        Command::New { name } => {
            let id = editor.create_project(name);
            writeln!(out, "{id}")?;
            Ok(())
        }
        Command::Rename { project, name } => {
            let id = find_project(editor, &project)?;
            editor.rename_project(&id, name)?;
            Ok(())
        }
        Command::Delete { project } => {
            let id = find_project(editor, &project)?;
            let removed = editor.delete_project(&id)?;
            writeln!(out, "Deleted \"{}\"", removed.name)?;
            Ok(())
        }
        Command::Add(args) => add_fixture(editor, args, out),
        Command::Set(args) => set_fixture(editor, args),
        Command::Duplicate(args) => {
            let id = select_element(editor, &args)?;
            let copy = editor.duplicate_element(id)?;
            writeln!(out, "{copy}")?;
            Ok(())
        }
        Command::Remove(args) => {
            let id = select_element(editor, &args)?;
            editor.delete_element(id)?;
            Ok(())
        }
        Command::Drag(args) => drag(editor, args, out),
        Command::Export(args) => export(editor, args, out),
    }?;
    if editor.has_unsaved_changes() {
        bail!("changes could not be written to the project store");
    }
    Ok(())
}

fn list_types(out: &mut dyn Write) -> anyhow::Result<()> {
    for def in fixtures::all() {
        writeln!(
            out,
            "{:<8} {:<8} {} {}x{}",
            def.id, def.display_name, def.base_color, def.nominal_width, def.nominal_height
        )?;
    }
    Ok(())
}

fn list_projects(editor: &Editor, out: &mut dyn Write) -> anyhow::Result<()> {
    for project in editor.projects() {
        let marker = if project.id == editor.current_project_id() { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {} {} ({} fixture(s))",
            project.id,
            project.name,
            project.len()
        )?;
    }
    Ok(())
}

fn show_project(
    editor: &mut Editor,
    project: &ProjectArg,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    select_project(editor, project)?;
    let project = editor.current_project();
    writeln!(out, "{} ({})", project.name, project.id)?;
    for (index, element) in project.elements.iter().enumerate() {
        let known = if element.fixture_type().is_some() { "" } else { " [unknown type]" };
        writeln!(
            out,
            "{:>3} {} {:<8} at {:.3},{:.3} scale {} {}{known}",
            index + 1,
            element.id,
            element.type_id,
            element.norm_x,
            element.norm_y,
            element.scale,
            element.color
        )?;
    }
    Ok(())
}

/// Find a project by exact id or name.
fn find_project(editor: &Editor, selector: &str) -> anyhow::Result<String> {
    editor
        .projects()
        .iter()
        .find(|p| p.id == selector)
        .or_else(|| editor.projects().iter().find(|p| p.name == selector))
        .map(|p| p.id.clone())
        .with_context(|| format!("no project with id or name '{selector}'"))
}

fn select_project(editor: &mut Editor, project: &ProjectArg) -> anyhow::Result<()> {
    if let Some(selector) = &project.project {
        let id = find_project(editor, selector)?;
        editor.select_project(&id)?;
    }
    Ok(())
}

/// Resolve an element by 1-based index or id prefix within the selected project.
fn select_element(editor: &mut Editor, args: &ElementArgs) -> anyhow::Result<ElementId> {
    select_project(editor, &args.project)?;
    let elements = &editor.current_project().elements;

    if let Ok(index) = args.element.parse::<usize>() {
        if let Some(element) = index.checked_sub(1).and_then(|i| elements.get(i)) {
            return Ok(element.id);
        }
    }
    let matches: Vec<ElementId> = elements
        .iter()
        .filter(|e| e.id.to_string().starts_with(&args.element))
        .map(|e| e.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no fixture '{}' in this project", args.element),
        _ => bail!("'{}' matches {} fixtures", args.element, matches.len()),
    }
}

fn add_fixture(editor: &mut Editor, args: AddArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    select_project(editor, &args.project)?;
    let id = editor.add_fixture(&args.type_id)?;
    if let Some(at) = args.at {
        editor.move_element(id, at)?;
    }
    if let Some(scale) = args.scale {
        editor.set_scale(id, scale)?;
    }
    if let Some(color) = args.color {
        editor.set_color(id, color)?;
    }
    writeln!(out, "{id}")?;
    Ok(())
}

fn set_fixture(editor: &mut Editor, args: SetArgs) -> anyhow::Result<()> {
    let id = select_element(editor, &args.target)?;
    if let Some(at) = args.at {
        editor.move_element(id, at)?;
    }
    if let Some(scale) = args.scale {
        editor.set_scale(id, scale)?;
    }
    if let Some(color) = args.color {
        editor.set_color(id, color)?;
    }
    Ok(())
}

fn drag(editor: &mut Editor, args: DragArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    select_project(editor, &args.project)?;
    let size = Size::new(args.canvas.width as f64, args.canvas.height as f64);
    let mut controller = InteractionController::new(size);

    let pointer = |phase: PointerPhase, at: Point| PointerInput::new(phase, at.x, at.y, 1);
    let outcome = controller.handle(editor, pointer(PointerPhase::Down, args.from));
    let InteractionOutcome::DragStarted(id) = outcome else {
        bail!("no fixture under {},{}", args.from.x, args.from.y);
    };
    controller.handle(editor, pointer(PointerPhase::Move, args.to));
    controller.handle(editor, pointer(PointerPhase::Up, args.to));

    let element = editor
        .current_project()
        .element(id)
        .context("dragged fixture disappeared")?;
    writeln!(out, "{} now at {:.3},{:.3}", element.id, element.norm_x, element.norm_y)?;
    Ok(())
}

fn export(editor: &mut Editor, args: ExportArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    select_project(editor, &args.project)?;
    let options = ExportOptions::default()
        .with_scale(args.scale)
        .with_legend(!args.no_legend);
    let project = editor.current_project();
    let bytes = render_to_image_with(project, args.canvas.width, args.canvas.height, &options)
        .with_context(|| format!("render '{}'", project.name))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    writeln!(out, "wrote {}", args.out.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use stagelight_core::storage::MemoryStorage;
    use std::sync::Arc;

    fn editor() -> Editor {
        Editor::open(Arc::new(MemoryStorage::new()))
    }

    fn exec(editor: &mut Editor, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("stagelight").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(editor, cli.cmd, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_types_lists_catalog() {
        let output = exec(&mut editor(), &["types"]).unwrap();
        assert_eq!(output.lines().count(), fixtures::FIXTURE_TYPES.len());
        assert!(output.contains("#facc15"));
    }

    #[test]
    fn test_add_and_show() {
        let mut editor = editor();
        exec(&mut editor, &["add", "wash", "--at", "0.25,0.5", "--scale", "2"]).unwrap();
        let element = &editor.current_project().elements[0];
        assert_eq!(element.norm_x, 0.25);
        assert_eq!(element.scale, 2.0);

        let output = exec(&mut editor, &["show"]).unwrap();
        assert!(output.contains("wash"));
        assert!(output.contains("0.250,0.500"));
    }

    #[test]
    fn test_add_unknown_type_fails() {
        let mut editor = editor();
        let err = exec(&mut editor, &["add", "laser"]).unwrap_err();
        assert!(err.to_string().contains("laser"));
    }

    #[test]
    fn test_new_project_by_name() {
        let mut editor = editor();
        exec(&mut editor, &["new", "Club night"]).unwrap();
        exec(&mut editor, &["add", "spot", "--project", "First project"]).unwrap();
        assert_eq!(editor.current_project().name, "First project");
        assert_eq!(editor.current_project().len(), 1);

        let listing = exec(&mut editor, &["list"]).unwrap();
        assert_eq!(listing.lines().count(), 2);
    }

    #[test]
    fn test_delete_last_project_fails() {
        let mut editor = editor();
        assert!(exec(&mut editor, &["delete", "First project"]).is_err());
        assert_eq!(editor.projects().len(), 1);
    }

    #[test]
    fn test_set_and_remove_by_index() {
        let mut editor = editor();
        exec(&mut editor, &["add", "spot"]).unwrap();
        exec(&mut editor, &["add", "par"]).unwrap();
        exec(&mut editor, &["set", "2", "--color", "#00ff00"]).unwrap();
        assert_eq!(editor.current_project().elements[1].color.to_hex(), "#00ff00");

        exec(&mut editor, &["remove", "1"]).unwrap();
        assert_eq!(editor.current_project().len(), 1);
        assert_eq!(editor.current_project().elements[0].type_id, "par");
        assert!(exec(&mut editor, &["remove", "5"]).is_err());
    }

    #[test]
    fn test_duplicate_by_id_prefix() {
        let mut editor = editor();
        exec(&mut editor, &["add", "beam"]).unwrap();
        let prefix = editor.current_project().elements[0].id.to_string()[..8].to_string();
        exec(&mut editor, &["duplicate", &prefix]).unwrap();
        assert_eq!(editor.current_project().len(), 2);
    }

    #[test]
    fn test_drag_moves_fixture() {
        let mut editor = editor();
        exec(&mut editor, &["add", "beam"]).unwrap();
        let output = exec(
            &mut editor,
            &["drag", "--from", "400,270", "--to", "350,250", "--width", "800", "--height", "600"],
        )
        .unwrap();
        assert!(output.contains("now at 0.422,0.444"));
        assert!(exec(&mut editor, &["drag", "--from", "5,5", "--to", "10,10"]).is_err());
    }

    #[test]
    fn test_export_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("stage.png");
        let mut editor = editor();
        exec(&mut editor, &["add", "fresnel"]).unwrap();
        exec(
            &mut editor,
            &["export", "--out", path.to_str().unwrap(), "--width", "320", "--height", "240"],
        )
        .unwrap();

        let decoder = png::Decoder::new(std::fs::File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (320, 240));
    }
}
