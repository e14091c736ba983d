//! Scene graph: projects and the fixture instances placed in them.

use crate::fixtures::{self, FixtureTypeDef};
use crate::layout::clamp_normalized;
use crate::paint::Rgb;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for a placed fixture.
pub type ElementId = Uuid;

/// Smallest accepted instance scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest accepted instance scale.
pub const MAX_SCALE: f64 = 5.0;
/// Offset applied on both axes when duplicating an element.
pub const DUPLICATE_OFFSET: f64 = 0.03;
/// Default physical stage width, in meters.
pub const DEFAULT_STAGE_WIDTH: f64 = 12.0;
/// Default physical stage depth, in meters.
pub const DEFAULT_STAGE_DEPTH: f64 = 8.0;

/// Validate an instance scale. Anything unusable becomes 1.0.
pub fn sanitize_scale(scale: f64) -> f64 {
    if !scale.is_finite() || scale <= 0.0 {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// One placed fixture instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneElement {
    pub id: ElementId,
    /// Key into the fixture registry.
    pub type_id: String,
    /// Horizontal position within the stage, in [0.02, 0.98].
    #[serde(alias = "x")]
    pub norm_x: f64,
    /// Vertical position within the stage, in [0.02, 0.98].
    #[serde(alias = "y")]
    pub norm_y: f64,
    pub scale: f64,
    pub color: Rgb,
}

impl SceneElement {
    /// Create an instance of a fixture type at the middle of the stage.
    pub fn new(def: &FixtureTypeDef) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_id: def.id.to_string(),
            norm_x: 0.5,
            norm_y: 0.5,
            scale: 1.0,
            color: def.base_color,
        }
    }

    /// Normalized position as a point.
    pub fn position(&self) -> Point {
        Point::new(self.norm_x, self.norm_y)
    }

    /// Move to a normalized position, clamping both axes.
    pub fn set_position(&mut self, position: Point) {
        self.norm_x = clamp_normalized(position.x);
        self.norm_y = clamp_normalized(position.y);
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = sanitize_scale(scale);
    }

    /// The registry entry for this element, if its type is known.
    pub fn fixture_type(&self) -> Option<&'static FixtureTypeDef> {
        fixtures::lookup(&self.type_id)
    }

    /// A copy with a fresh id, offset by [`DUPLICATE_OFFSET`] and clamped.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.set_position(Point::new(
            self.norm_x + DUPLICATE_OFFSET,
            self.norm_y + DUPLICATE_OFFSET,
        ));
        copy
    }

    /// Re-establish the storage invariants on data read from outside.
    pub(crate) fn sanitize(&mut self) {
        self.set_position(self.position());
        self.set_scale(self.scale);
    }
}

/// A scene: a named, ordered list of fixtures (later = drawn on top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default = "default_stage_width")]
    pub stage_width: f64,
    #[serde(default = "default_stage_depth")]
    pub stage_depth: f64,
    /// Creation time in milliseconds since the unix epoch.
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub elements: Vec<SceneElement>,
}

fn default_stage_width() -> f64 {
    DEFAULT_STAGE_WIDTH
}

fn default_stage_depth() -> f64 {
    DEFAULT_STAGE_DEPTH
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            stage_width: DEFAULT_STAGE_WIDTH,
            stage_depth: DEFAULT_STAGE_DEPTH,
            created_at: now_millis(),
            elements: Vec::new(),
        }
    }

    /// Append an element on top of the z-order.
    pub fn add_element(&mut self, element: SceneElement) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Remove an element, returning it if it existed.
    pub fn remove_element(&mut self, id: ElementId) -> Option<SceneElement> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(index))
    }

    pub fn element(&self, id: ElementId) -> Option<&SceneElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut SceneElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Duplicate an element; the copy goes on top. Returns the new id.
    pub fn duplicate_element(&mut self, id: ElementId) -> Option<ElementId> {
        let copy = self.element(id)?.duplicate();
        Some(self.add_element(copy))
    }

    /// Distinct fixture types present, in first-appearance order, with counts.
    /// Unknown types are left out.
    pub fn fixture_summary(&self) -> Vec<(&'static FixtureTypeDef, usize)> {
        let mut summary: Vec<(&'static FixtureTypeDef, usize)> = Vec::new();
        for def in self.elements.iter().filter_map(SceneElement::fixture_type) {
            match summary.iter_mut().find(|(d, _)| d.id == def.id) {
                Some((_, count)) => *count += 1,
                None => summary.push((def, 1)),
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn sanitize(&mut self) {
        for element in &mut self.elements {
            element.sanitize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot() -> SceneElement {
        SceneElement::new(fixtures::lookup("spot").unwrap())
    }

    #[test]
    fn test_new_element_defaults() {
        let el = spot();
        assert_eq!(el.type_id, "spot");
        assert_eq!(el.position(), Point::new(0.5, 0.5));
        assert_eq!(el.scale, 1.0);
        assert_eq!(el.color, fixtures::lookup("spot").unwrap().base_color);
    }

    #[test]
    fn test_set_position_clamps() {
        let mut el = spot();
        el.set_position(Point::new(-1.0, 3.0));
        assert_eq!(el.position(), Point::new(0.02, 0.98));
    }

    #[test]
    fn test_scale_validation() {
        let mut el = spot();
        el.set_scale(-2.0);
        assert_eq!(el.scale, 1.0);
        el.set_scale(f64::NAN);
        assert_eq!(el.scale, 1.0);
        el.set_scale(100.0);
        assert_eq!(el.scale, MAX_SCALE);
        el.set_scale(1.75);
        assert_eq!(el.scale, 1.75);
    }

    #[test]
    fn test_duplicate_semantics() {
        let mut el = spot();
        el.set_position(Point::new(0.4, 0.97));
        el.scale = 2.0;
        el.color = Rgb::new(1, 2, 3);

        let copy = el.duplicate();
        assert_ne!(copy.id, el.id);
        assert_eq!(copy.type_id, el.type_id);
        assert_eq!(copy.scale, el.scale);
        assert_eq!(copy.color, el.color);
        assert!((copy.norm_x - (0.4 + DUPLICATE_OFFSET)).abs() < 1e-12);
        assert_eq!(copy.norm_y, 0.98);
    }

    #[test]
    fn test_project_duplicate_goes_on_top() {
        let mut project = Project::new("Test");
        let first = project.add_element(spot());
        let copy = project.duplicate_element(first).unwrap();
        assert_eq!(project.elements.last().unwrap().id, copy);
        assert!(project.duplicate_element(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_remove_element() {
        let mut project = Project::new("Test");
        let id = project.add_element(spot());
        assert!(project.remove_element(id).is_some());
        assert!(project.remove_element(id).is_none());
        assert!(project.is_empty());
    }

    #[test]
    fn test_fixture_summary_skips_unknown() {
        let mut project = Project::new("Test");
        project.add_element(spot());
        let mut ghost = spot();
        ghost.type_id = "laser".to_string();
        project.add_element(ghost);
        project.add_element(SceneElement::new(fixtures::lookup("bar").unwrap()));
        project.add_element(spot());

        let summary: Vec<_> = project
            .fixture_summary()
            .into_iter()
            .map(|(def, count)| (def.id, count))
            .collect();
        assert_eq!(summary, vec![("spot", 2), ("bar", 1)]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut project = Project::new("Field names");
        project.add_element(spot());
        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("stageWidth").is_some());
        assert!(json.get("stageDepth").is_some());
        let element = &json["elements"][0];
        for key in ["id", "typeId", "normX", "normY", "scale", "color"] {
            assert!(element.get(key).is_some(), "missing {key}");
        }
        assert_eq!(element["color"], "#facc15");
    }

    #[test]
    fn test_legacy_xy_fields_are_accepted() {
        let json = r##"{
            "id": "p1",
            "name": "Legacy",
            "createdAt": 1700000000000,
            "elements": [{
                "id": "6f1c1f52-49a4-4d3a-9d43-4d2a9fbd4e0d",
                "typeId": "wash",
                "x": 1.5,
                "y": 0.25,
                "scale": 1,
                "color": "#fb923c"
            }]
        }"##;
        let mut project: Project = serde_json::from_str(json).unwrap();
        project.sanitize();
        assert_eq!(project.stage_width, DEFAULT_STAGE_WIDTH);
        assert_eq!(project.elements[0].norm_x, 0.98);
        assert_eq!(project.elements[0].norm_y, 0.25);
    }
}
