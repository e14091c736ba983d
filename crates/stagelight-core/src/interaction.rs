//! Pointer interaction: click to select, drag to move.

use crate::editor::Editor;
use crate::hit_test::hit_test;
use crate::layout::resolve_stage;
use crate::scene::ElementId;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform took the pointer away (e.g. lost capture).
    Cancel,
}

/// A pointer event in client (window) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub client_x: f64,
    pub client_y: f64,
    /// Identifies the pointer (mouse, finger, pen) across a gesture.
    pub pointer_id: u64,
}

impl PointerInput {
    pub fn new(phase: PointerPhase, client_x: f64, client_y: f64, pointer_id: u64) -> Self {
        Self {
            phase,
            client_x,
            client_y,
            pointer_id,
        }
    }

    pub fn client_position(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// Drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        element_id: ElementId,
        /// Pointer position minus element center, in canvas pixels.
        grab_offset: Vec2,
        pointer_id: u64,
    },
}

/// What a pointer event did to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Ignored,
    /// The press changed the selection without hitting an element.
    SelectionChanged,
    /// The press hit an element, selected it and started a drag.
    DragStarted(ElementId),
    Moved(ElementId),
    /// The drag ended.
    Released(ElementId),
}

/// Translates pointer input on the canvas into editor operations.
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: DragState,
    /// Client-space position of the canvas' top-left corner.
    canvas_origin: Point,
    /// Logical canvas size.
    canvas_size: Size,
}

impl InteractionController {
    pub fn new(canvas_size: Size) -> Self {
        Self {
            state: DragState::Idle,
            canvas_origin: Point::ZERO,
            canvas_size,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.canvas_origin = origin;
    }

    /// Update the canvas size. Takes effect on the next event.
    pub fn resize(&mut self, canvas_size: Size) {
        self.canvas_size = canvas_size;
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Handle one pointer event.
    pub fn handle(&mut self, editor: &mut Editor, input: PointerInput) -> InteractionOutcome {
        let local = input.client_position() - self.canvas_origin.to_vec2();
        match input.phase {
            PointerPhase::Down => self.pointer_down(editor, local, input.pointer_id),
            PointerPhase::Move => self.pointer_move(editor, local, input.pointer_id),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(input.pointer_id),
        }
    }

    fn pointer_down(
        &mut self,
        editor: &mut Editor,
        local: Point,
        pointer_id: u64,
    ) -> InteractionOutcome {
        if let DragState::Dragging {
            element_id,
            pointer_id: owner,
            ..
        } = self.state
        {
            if owner != pointer_id {
                return InteractionOutcome::Ignored;
            }
            // The owning pointer's release never arrived.
            log::debug!("Abandoning stale drag on {}", element_id);
            self.state = DragState::Idle;
        }
        let stage = resolve_stage(self.canvas_size.width, self.canvas_size.height);
        let hit = hit_test(editor.current_project(), &stage, local)
            .map(|element| (element.id, stage.normalized_to_pixel(element.position())));

        match hit {
            Some((element_id, center)) => {
                editor.select(Some(element_id));
                self.state = DragState::Dragging {
                    element_id,
                    grab_offset: local - center,
                    pointer_id,
                };
                log::debug!("Drag started on {}", element_id);
                InteractionOutcome::DragStarted(element_id)
            }
            None if editor.select(None) => InteractionOutcome::SelectionChanged,
            None => InteractionOutcome::Ignored,
        }
    }

    fn pointer_move(
        &mut self,
        editor: &mut Editor,
        local: Point,
        pointer_id: u64,
    ) -> InteractionOutcome {
        let DragState::Dragging {
            element_id,
            grab_offset,
            pointer_id: owner,
        } = self.state
        else {
            return InteractionOutcome::Ignored;
        };
        if owner != pointer_id {
            return InteractionOutcome::Ignored;
        }

        let stage = resolve_stage(self.canvas_size.width, self.canvas_size.height);
        let target = stage.pixel_to_normalized(local - grab_offset);
        match editor.move_element(element_id, target) {
            Ok(()) => InteractionOutcome::Moved(element_id),
            Err(e) => {
                log::warn!("Dropping drag: {}", e);
                self.state = DragState::Idle;
                InteractionOutcome::Ignored
            }
        }
    }

    fn pointer_up(&mut self, pointer_id: u64) -> InteractionOutcome {
        match self.state {
            DragState::Dragging {
                element_id,
                pointer_id: owner,
                ..
            } if owner == pointer_id => {
                self.state = DragState::Idle;
                InteractionOutcome::Released(element_id)
            }
            _ => InteractionOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn setup() -> (Editor, InteractionController) {
        let editor = Editor::open(Arc::new(MemoryStorage::new()));
        let controller = InteractionController::new(Size::new(800.0, 600.0));
        (editor, controller)
    }

    fn input(phase: PointerPhase, x: f64, y: f64) -> PointerInput {
        PointerInput::new(phase, x, y, 1)
    }

    #[test]
    fn test_drag_moves_element() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("beam").unwrap();
        editor.select(None);

        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 400.0, 270.0)),
            InteractionOutcome::DragStarted(id)
        );
        assert_eq!(editor.selection(), Some(id));
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Move, 350.0, 250.0)),
            InteractionOutcome::Moved(id)
        );

        let el = editor.current_project().element(id).unwrap();
        assert!((el.norm_x - (0.5 - 50.0 / 640.0)).abs() < 1e-9);
        assert!((el.norm_y - (0.5 - 20.0 / 360.0)).abs() < 1e-9);

        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Up, 350.0, 250.0)),
            InteractionOutcome::Released(id)
        );
        assert_eq!(controller.state(), DragState::Idle);
    }

    #[test]
    fn test_grab_offset_is_preserved() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("wash").unwrap();
        // Grab 10px right and 5px below the center.
        controller.handle(&mut editor, input(PointerPhase::Down, 410.0, 275.0));
        controller.handle(&mut editor, input(PointerPhase::Move, 474.0, 311.0));

        let el = editor.current_project().element(id).unwrap();
        assert!((el.norm_x - 0.6).abs() < 1e-9);
        assert!((el.norm_y - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_drag_clamps_to_stage() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.handle(&mut editor, input(PointerPhase::Down, 400.0, 270.0));
        controller.handle(&mut editor, input(PointerPhase::Move, -500.0, 2000.0));
        let el = editor.current_project().element(id).unwrap();
        assert_eq!(el.position(), Point::new(0.02, 0.98));
    }

    #[test]
    fn test_press_on_empty_clears_selection() {
        let (mut editor, mut controller) = setup();
        editor.add_fixture("spot").unwrap();
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 100.0, 100.0)),
            InteractionOutcome::SelectionChanged
        );
        assert_eq!(editor.selection(), None);
        assert!(!controller.is_dragging());
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 100.0, 100.0)),
            InteractionOutcome::Ignored
        );
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Move, 300.0, 200.0)),
            InteractionOutcome::Ignored
        );
        assert_eq!(editor.current_project().element(id).unwrap().position(), Point::new(0.5, 0.5));
    }

    #[test]
    fn test_other_pointer_is_ignored_during_drag() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.handle(&mut editor, input(PointerPhase::Down, 400.0, 270.0));

        let other = PointerInput::new(PointerPhase::Move, 100.0, 100.0, 2);
        assert_eq!(controller.handle(&mut editor, other), InteractionOutcome::Ignored);
        let other_up = PointerInput::new(PointerPhase::Up, 100.0, 100.0, 2);
        assert_eq!(controller.handle(&mut editor, other_up), InteractionOutcome::Ignored);
        assert!(controller.is_dragging());

        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Cancel, 0.0, 0.0)),
            InteractionOutcome::Released(id)
        );
    }

    #[test]
    fn test_press_without_release_restarts_drag() {
        let (mut editor, mut controller) = setup();
        let a = editor.add_fixture("spot").unwrap();
        editor.move_element(a, Point::new(0.25, 0.5)).unwrap();
        let b = editor.add_fixture("spot").unwrap();
        editor.move_element(b, Point::new(0.75, 0.5)).unwrap();

        // Press on A, release lost, then press on B with the same pointer.
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 240.0, 270.0)),
            InteractionOutcome::DragStarted(a)
        );
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 560.0, 270.0)),
            InteractionOutcome::DragStarted(b)
        );
        assert_eq!(editor.selection(), Some(b));

        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Move, 580.0, 270.0)),
            InteractionOutcome::Moved(b)
        );
        assert_eq!(editor.current_project().element(a).unwrap().position(), Point::new(0.25, 0.5));
    }

    #[test]
    fn test_other_pointer_press_is_ignored_during_drag() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.handle(&mut editor, input(PointerPhase::Down, 400.0, 270.0));

        let other = PointerInput::new(PointerPhase::Down, 100.0, 100.0, 2);
        assert_eq!(controller.handle(&mut editor, other), InteractionOutcome::Ignored);
        assert_eq!(editor.selection(), Some(id));
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_canvas_origin_offsets_client_coordinates() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.set_canvas_origin(Point::new(20.0, 40.0));
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 420.0, 310.0)),
            InteractionOutcome::DragStarted(id)
        );
    }

    #[test]
    fn test_resize_uses_fresh_stage() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.resize(Size::new(400.0, 300.0));
        // Center on a 400x300 canvas is (200, 135).
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Down, 200.0, 135.0)),
            InteractionOutcome::DragStarted(id)
        );
    }

    #[test]
    fn test_element_deleted_mid_drag() {
        let (mut editor, mut controller) = setup();
        let id = editor.add_fixture("spot").unwrap();
        controller.handle(&mut editor, input(PointerPhase::Down, 400.0, 270.0));
        editor.delete_element(id).unwrap();
        assert_eq!(
            controller.handle(&mut editor, input(PointerPhase::Move, 300.0, 200.0)),
            InteractionOutcome::Ignored
        );
        assert!(!controller.is_dragging());
    }
}
