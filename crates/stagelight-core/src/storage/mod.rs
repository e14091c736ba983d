//! Storage abstraction for persistence.
//!
//! The whole project collection lives under a single key of a key-value store and
//! is rewritten after every mutation (last write wins).

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::scene::Project;
use thiserror::Error;

/// Key holding the serialized project collection.
pub const PROJECTS_KEY: &str = "stagelight_projects_v1";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for key-value storage backends.
///
/// Implementations can keep values in memory or on the local filesystem.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Load the project collection.
///
/// Missing, unreadable or malformed data all yield an empty list; the caller is
/// expected to synthesize a default project in that case.
pub fn load_projects(store: &dyn KeyValueStore) -> Vec<Project> {
    let raw = match store.get(PROJECTS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read stored projects: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Project>>(&raw) {
        Ok(mut projects) => {
            for project in &mut projects {
                project.sanitize();
            }
            log::debug!("Loaded {} project(s)", projects.len());
            projects
        }
        Err(e) => {
            log::warn!("Stored projects are malformed, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Serialize and write the whole project collection.
pub fn save_projects(store: &dyn KeyValueStore, projects: &[Project]) -> StorageResult<()> {
    let json = serde_json::to_string(projects)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    store.set(PROJECTS_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::scene::SceneElement;

    #[test]
    fn test_missing_key_is_empty() {
        let store = MemoryStorage::new();
        assert!(load_projects(&store).is_empty());
    }

    #[test]
    fn test_corrupt_data_is_empty() {
        let store = MemoryStorage::new();
        store.set(PROJECTS_KEY, "{not json").unwrap();
        assert!(load_projects(&store).is_empty());

        store.set(PROJECTS_KEY, r#"{"id": "not-a-list"}"#).unwrap();
        assert!(load_projects(&store).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStorage::new();
        let mut project = Project::new("Round trip");
        project.add_element(SceneElement::new(fixtures::lookup("par").unwrap()));

        save_projects(&store, std::slice::from_ref(&project)).unwrap();
        let loaded = load_projects(&store);

        assert_eq!(loaded, vec![project]);
    }

    #[test]
    fn test_load_clamps_out_of_range_values() {
        let store = MemoryStorage::new();
        let json = r##"[{
            "id": "p",
            "name": "Out of range",
            "stageWidth": 10,
            "stageDepth": 6,
            "elements": [{
                "id": "0b5d2b8c-2c43-4c59-9a51-6f2f0f7c1e11",
                "typeId": "spot",
                "normX": -0.5,
                "normY": 1.5,
                "scale": -3,
                "color": "#ffffff"
            }]
        }]"##;
        store.set(PROJECTS_KEY, json).unwrap();

        let loaded = load_projects(&store);
        let element = &loaded[0].elements[0];
        assert_eq!((element.norm_x, element.norm_y), (0.02, 0.98));
        assert_eq!(element.scale, 1.0);
    }
}
