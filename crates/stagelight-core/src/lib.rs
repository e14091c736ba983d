//! Stagelight Core Library
//!
//! Platform-agnostic data model, stage layout, beam templates, hit testing and
//! editing logic for the Stagelight stage-lighting editor.

pub mod beam;
pub mod editor;
pub mod fixtures;
pub mod interaction;
pub mod layout;
pub mod paint;
pub mod scene;
pub mod storage;

pub use beam::{BeamShape, Layer, LensGlyph, VisualLayers, VisualSpec, compute_visual};
pub use editor::{Editor, EditorError, EditorResult};
pub use fixtures::FixtureTypeDef;
pub use hit_test::{hit_test, hit_test_index};
pub use interaction::{
    DragState, InteractionController, InteractionOutcome, PointerInput, PointerPhase,
};
pub use layout::{StageRect, fixture_bounds, resolve_stage};
pub use paint::{GradientStop, Paint, Rgb, Rgba};
pub use scene::{ElementId, Project, SceneElement};
pub use storage::{KeyValueStore, MemoryStorage, StorageError, StorageResult};
