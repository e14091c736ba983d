//! Editor state: the project collection, the current project and the selection.
//!
//! Every mutating operation persists the whole collection right away and raises
//! the redraw flag. A failed write is logged and remembered, but the in-memory
//! change stays in effect.

use crate::fixtures;
use crate::paint::Rgb;
use crate::scene::{ElementId, Project, SceneElement};
use crate::storage::{KeyValueStore, load_projects, save_projects};
use kurbo::Point;
use std::sync::Arc;
use thiserror::Error;

/// Name given to the project synthesized when the store is empty.
pub const DEFAULT_PROJECT_NAME: &str = "First project";

/// Errors surfaced to the user by editor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
    #[error("The last remaining project cannot be deleted")]
    LastProject,
    #[error("Unknown fixture type: {0}")]
    UnknownFixtureType(String),
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Application state for one editing session.
pub struct Editor {
    store: Arc<dyn KeyValueStore>,
    projects: Vec<Project>,
    /// Id of the current project. Always refers to an entry of `projects`.
    current: String,
    selection: Option<ElementId>,
    needs_redraw: bool,
    unsaved: bool,
}

impl Editor {
    /// Open the editor on a store, creating a default project if it holds none.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut projects = load_projects(store.as_ref());
        let created_default = projects.is_empty();
        if created_default {
            log::info!("No stored projects, creating \"{}\"", DEFAULT_PROJECT_NAME);
            projects.push(Project::new(DEFAULT_PROJECT_NAME));
        }
        let current = projects[0].id.clone();
        let mut editor = Self {
            store,
            projects,
            current,
            selection: None,
            needs_redraw: true,
            unsaved: false,
        };
        if created_default {
            editor.persist();
        }
        editor
    }

    /// All projects, most recently created first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn current_index(&self) -> usize {
        self.projects
            .iter()
            .position(|p| p.id == self.current)
            .unwrap_or(0)
    }

    pub fn current_project(&self) -> &Project {
        &self.projects[self.current_index()]
    }

    fn current_project_mut(&mut self) -> &mut Project {
        let index = self.current_index();
        &mut self.projects[index]
    }

    pub fn current_project_id(&self) -> &str {
        &self.current_project().id
    }

    /// Create a project at the front of the list and switch to it.
    pub fn create_project(&mut self, name: impl Into<String>) -> String {
        let project = Project::new(name);
        let id = project.id.clone();
        log::info!("Created project \"{}\" ({})", project.name, id);
        self.projects.insert(0, project);
        self.current = id.clone();
        self.selection = None;
        self.persist();
        id
    }

    /// Switch to another project. Clears the selection.
    pub fn select_project(&mut self, id: &str) -> EditorResult<()> {
        if self.project(id).is_none() {
            return Err(EditorError::ProjectNotFound(id.to_string()));
        }
        self.current = id.to_string();
        self.selection = None;
        self.needs_redraw = true;
        Ok(())
    }

    pub fn rename_project(&mut self, id: &str, name: impl Into<String>) -> EditorResult<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EditorError::ProjectNotFound(id.to_string()))?;
        project.name = name.into();
        self.persist();
        Ok(())
    }

    /// Delete a project. The last remaining project is refused.
    ///
    /// Deleting the current project switches to the first remaining one.
    pub fn delete_project(&mut self, id: &str) -> EditorResult<Project> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EditorError::ProjectNotFound(id.to_string()))?;
        if self.projects.len() == 1 {
            log::warn!("Refusing to delete the last project");
            return Err(EditorError::LastProject);
        }
        let removed = self.projects.remove(index);
        if removed.id == self.current {
            self.current = self.projects[0].id.clone();
            self.selection = None;
        }
        self.persist();
        Ok(removed)
    }

    /// Add a fixture at the middle of the stage and select it.
    pub fn add_fixture(&mut self, type_id: &str) -> EditorResult<ElementId> {
        let def = fixtures::lookup(type_id)
            .ok_or_else(|| EditorError::UnknownFixtureType(type_id.to_string()))?;
        let id = self.current_project_mut().add_element(SceneElement::new(def));
        self.selection = Some(id);
        self.persist();
        Ok(id)
    }

    /// Currently selected element id, if any.
    pub fn selection(&self) -> Option<ElementId> {
        self.selection
    }

    pub fn selected_element(&self) -> Option<&SceneElement> {
        self.selection.and_then(|id| self.current_project().element(id))
    }

    /// Change the selection. Ids not in the current project clear it.
    /// Returns whether the selection changed.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        let id = id.filter(|id| self.current_project().element(*id).is_some());
        if id == self.selection {
            return false;
        }
        self.selection = id;
        self.needs_redraw = true;
        true
    }

    /// Remove an element from the current project.
    pub fn delete_element(&mut self, id: ElementId) -> EditorResult<SceneElement> {
        let removed = self
            .current_project_mut()
            .remove_element(id)
            .ok_or(EditorError::ElementNotFound(id))?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.persist();
        Ok(removed)
    }

    /// Remove the selected element, if any.
    pub fn delete_selected(&mut self) -> Option<SceneElement> {
        let id = self.selection?;
        self.delete_element(id).ok()
    }

    /// Duplicate an element; the copy is placed on top and selected.
    pub fn duplicate_element(&mut self, id: ElementId) -> EditorResult<ElementId> {
        let copy = self
            .current_project_mut()
            .duplicate_element(id)
            .ok_or(EditorError::ElementNotFound(id))?;
        self.selection = Some(copy);
        self.persist();
        Ok(copy)
    }

    pub fn duplicate_selected(&mut self) -> Option<ElementId> {
        let id = self.selection?;
        self.duplicate_element(id).ok()
    }

    fn element_mut(&mut self, id: ElementId) -> EditorResult<&mut SceneElement> {
        self.current_project_mut()
            .element_mut(id)
            .ok_or(EditorError::ElementNotFound(id))
    }

    /// Move an element to a normalized position (clamped to the stage).
    pub fn move_element(&mut self, id: ElementId, position: Point) -> EditorResult<()> {
        self.element_mut(id)?.set_position(position);
        self.persist();
        Ok(())
    }

    /// Set an element's scale (validated and clamped).
    pub fn set_scale(&mut self, id: ElementId, scale: f64) -> EditorResult<()> {
        self.element_mut(id)?.set_scale(scale);
        self.persist();
        Ok(())
    }

    pub fn set_color(&mut self, id: ElementId, color: Rgb) -> EditorResult<()> {
        self.element_mut(id)?.color = color;
        self.persist();
        Ok(())
    }

    /// Ask for a repaint without changing anything (e.g. after a resize).
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the pending redraw request. Hosts call this once per display refresh,
    /// so any number of mutations between two refreshes cost one repaint.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Whether the last write to the store failed.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    fn persist(&mut self) {
        self.needs_redraw = true;
        match save_projects(self.store.as_ref(), &self.projects) {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                log::error!("Failed to save projects: {}", e);
                self.unsaved = true;
            }
        }
    }
}
