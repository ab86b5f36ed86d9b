//! # Project Storage
//!
//! The ledger itself never does I/O. Anything that needs to keep projects
//! between sessions goes through a [`ProjectStore`].
//!
//! - [`MemoryStore`] keeps projects in a map (tests, scratch sessions)
//! - [`DirectoryStore`] keeps one `<id>.boq` file per project under a directory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::errors::{BoqError, BoqResult};
use crate::file_io::{load_project, save_project, PROJECT_EXTENSION};
use crate::project::Project;

/// Load/save seam for whole projects.
pub trait ProjectStore {
    /// Load a project by id.
    ///
    /// Returns `BoqError::ProjectNotFound` when the store holds no such project.
    fn load(&self, id: &Uuid) -> BoqResult<Project>;

    /// Save (insert or replace) a project under its own id.
    fn save(&mut self, project: &Project) -> BoqResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: HashMap<Uuid, Project>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self, id: &Uuid) -> BoqResult<Project> {
        self.projects
            .get(id)
            .cloned()
            .ok_or_else(|| BoqError::project_not_found(id.to_string()))
    }

    fn save(&mut self, project: &Project) -> BoqResult<()> {
        self.projects.insert(project.id(), project.clone());
        Ok(())
    }
}

/// One `.boq` file per project, named by project id.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> BoqResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| BoqError::file_error("create store", root.display().to_string(), e.to_string()))?;
        debug!(root = %root.display(), "opened project store");
        Ok(DirectoryStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("{}.{}", id, PROJECT_EXTENSION))
    }

    /// Ids of every project file in the directory. Files not named by a uuid are skipped.
    pub fn ids(&self) -> BoqResult<Vec<Uuid>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| BoqError::file_error("list store", self.root.display().to_string(), e.to_string()))?;
        let mut ids: Vec<Uuid> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).and_then(|s| Uuid::parse_str(s).ok()))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl ProjectStore for DirectoryStore {
    fn load(&self, id: &Uuid) -> BoqResult<Project> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(BoqError::project_not_found(id.to_string()));
        }
        load_project(&path)
    }

    fn save(&mut self, project: &Project) -> BoqResult<()> {
        save_project(project, &self.path_for(&project.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::ItemKind;
    use std::env::temp_dir;

    fn sample_project() -> Project {
        let mut project = Project::new("Duplex", "Mr. Ade");
        let gid = project.add_grouping("Concrete Works");
        project.add_item(Some(gid), ItemKind::PricedItem);
        project
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let project = sample_project();
        store.save(&project).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&project.id()).unwrap(), project);
    }

    #[test]
    fn test_memory_store_replaces() {
        let mut store = MemoryStore::new();
        let mut project = sample_project();
        store.save(&project).unwrap();
        project.set_title("Duplex v2");
        store.save(&project).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&project.id()).unwrap().meta.title, "Duplex v2");
    }

    #[test]
    fn test_missing_project() {
        let store = MemoryStore::new();
        let err = store.load(&Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "PROJECT_NOT_FOUND");
    }

    #[test]
    fn test_directory_store_roundtrip() {
        let root = temp_dir().join(format!("boq_store_{}", std::process::id()));
        let mut store = DirectoryStore::open(&root).unwrap();
        let project = sample_project();

        store.save(&project).unwrap();
        assert!(store.path_for(&project.id()).exists());
        assert_eq!(store.ids().unwrap(), vec![project.id()]);
        assert_eq!(store.load(&project.id()).unwrap(), project);

        let err = store.load(&Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "PROJECT_NOT_FOUND");

        let _ = fs::remove_dir_all(&root);
    }
}
