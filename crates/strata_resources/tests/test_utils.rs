//! Shared test utilities for `strata_resources` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "each test binary uses a different subset of these helpers"
)]

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_resources::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn color(name: &str, value: &str) -> ResourceItem {
    ResourceItem::text(ResourceType::Color, name, value)
}

pub fn string(name: &str, value: &str) -> ResourceItem {
    ResourceItem::text(ResourceType::String, name, value)
}

pub fn id(name: &str) -> ResourceItem {
    ResourceItem::new(ResourceType::Id, name)
}

pub fn styleable(name: &str, attrs: &[&str]) -> ResourceItem {
    ResourceItem::new(ResourceType::Styleable, name).with_value(ResourceValue::Styleable {
        attrs: attrs.iter().map(ToString::to_string).collect(),
    })
}

pub fn leaf(graph: &ResourceGraph, name: &str, items: Vec<ResourceItem>) -> RepositoryId {
    graph.add_leaf(name, ResourceMap::from_items(items))
}

/// Text values of `name` in a merged table, in order.
pub fn values(table: &ResourceTable, name: &str) -> Vec<String> {
    table
        .get(name)
        .iter()
        .filter_map(|item| item.text_value().map(ToString::to_string))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY DISK
// ═══════════════════════════════════════════════════════════════════════════════

/// Libraries and metadata files held in memory.
#[derive(Default)]
pub struct MemoryLoader {
    folders: Mutex<HashMap<PathBuf, Vec<ResourceItem>>>,
    files: Mutex<HashMap<PathBuf, String>>,
    loads: Mutex<Vec<PathBuf>>,
}

impl MemoryLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds a library extracted to `folder`, with its resources in `folder/res`.
    pub fn add_library(&self, folder: &str, items: Vec<ResourceItem>) -> PathBuf {
        let res = Path::new(folder).join("res");
        self.folders.lock().insert(res.clone(), items);
        res
    }

    /// Writes a metadata file next to a library's resource folder.
    pub fn add_file(&self, folder: &str, name: &str, content: &str) {
        self.files
            .lock()
            .insert(Path::new(folder).join(name), content.to_string());
    }

    /// Replaces a library's items, as an edit on disk would.
    pub fn set_items(&self, folder: &str, items: Vec<ResourceItem>) {
        self.folders
            .lock()
            .insert(Path::new(folder).join("res"), items);
    }

    /// Resource folders loaded so far, in order.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().clone()
    }
}

impl LibraryLoader for MemoryLoader {
    fn load_items(&self, res_dir: &Path) -> ResourceMap {
        self.loads.lock().push(res_dir.to_path_buf());
        let items = self.folders.lock().get(res_dir).cloned().unwrap_or_default();
        ResourceMap::from_items(items)
    }

    fn exists(&self, path: &Path) -> bool {
        self.folders.lock().contains_key(path) || self.files.lock().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

pub fn manifest(package: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" package=\"{package}\">\n</manifest>\n"
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

/// A module whose build model can be swapped between syncs.
pub struct TestModule {
    name: String,
    model: Mutex<Option<BuildModel>>,
    requires_model: bool,
    dependencies: Mutex<Vec<Arc<dyn ModuleHandle>>>,
    ide_folders: Mutex<Vec<PathBuf>>,
    resources: RepositoryId,
}

impl TestModule {
    pub fn new(name: &str, resources: RepositoryId) -> Self {
        Self {
            name: name.to_string(),
            model: Mutex::new(None),
            requires_model: true,
            dependencies: Mutex::new(Vec::new()),
            ide_folders: Mutex::new(Vec::new()),
            resources,
        }
    }

    /// A module configured without a build model.
    pub fn plain(name: &str, resources: RepositoryId) -> Self {
        Self {
            requires_model: false,
            ..Self::new(name, resources)
        }
    }

    pub fn with_libraries(self, libraries: Vec<Library>) -> Self {
        self.set_libraries(libraries);
        self
    }

    pub fn set_libraries(&self, libraries: Vec<Library>) {
        self.set_model(Some(BuildModel {
            variant: "debug".to_string(),
            libraries,
        }));
    }

    pub fn set_model(&self, model: Option<BuildModel>) {
        *self.model.lock() = model;
    }

    pub fn set_variant(&self, variant: &str) {
        if let Some(model) = self.model.lock().as_mut() {
            model.variant = variant.to_string();
        }
    }

    pub fn add_dependency(&self, module: Arc<dyn ModuleHandle>) {
        self.dependencies.lock().push(module);
    }

    pub fn set_ide_folders(&self, folders: Vec<PathBuf>) {
        *self.ide_folders.lock() = folders;
    }
}

impl ModuleHandle for TestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn build_model(&self) -> Option<BuildModel> {
        self.model.lock().clone()
    }

    fn requires_build_model(&self) -> bool {
        self.requires_model
    }

    fn dependencies(&self) -> Vec<Arc<dyn ModuleHandle>> {
        self.dependencies.lock().clone()
    }

    fn ide_library_folders(&self) -> Vec<PathBuf> {
        self.ide_folders.lock().clone()
    }

    fn project_resources(&self) -> RepositoryId {
        self.resources
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// A context over `loader` plus a project leaf holding `items`.
pub fn project(
    loader: &Arc<MemoryLoader>,
    items: Vec<ResourceItem>,
) -> (ResourceContext, RepositoryId) {
    let context = ResourceContext::new(Arc::clone(loader) as Arc<dyn LibraryLoader>);
    let resources = leaf(context.graph(), "app/res", items);
    (context, resources)
}
