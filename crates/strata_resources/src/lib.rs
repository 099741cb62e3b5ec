//! Layered resource repositories for Strata (Layer 2).
//!
//! Resources declared by a module, its module dependencies and its external
//! libraries are merged into one view per module:
//!
//! - [`graph`] - leaf and composite repositories with generation-counted caches
//! - [`library`] - library discovery from the build model and shared loading
//! - [`app`] - the per-module top-level repository and its id tables
//! - [`ids`] - compiled and dynamic resource ids
//! - [`classgen`] / [`registry`] - accessor class bytecode on demand
//! - [`context`] - process-wide owner of all of the above
//! - [`plugin`] - server integration driven by sync and build events
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use std::sync::Arc;
//! use strata_resources::prelude::*;
//!
//! struct Project { resources: RepositoryId }
//!
//! impl ModuleHandle for Project {
//!     fn name(&self) -> &str { "app" }
//!     fn build_model(&self) -> Option<BuildModel> { None }
//!     fn dependencies(&self) -> Vec<Arc<dyn ModuleHandle>> { Vec::new() }
//!     fn project_resources(&self) -> RepositoryId { self.resources }
//! }
//!
//! struct NoLibraries;
//! impl LibraryLoader for NoLibraries {
//!     fn load_items(&self, _res_dir: &Path) -> ResourceMap { ResourceMap::new() }
//! }
//!
//! let context = ResourceContext::new(Arc::new(NoLibraries));
//! let resources = context.graph().add_leaf(
//!     "app/res",
//!     ResourceMap::from_items([ResourceItem::text(ResourceType::String, "app_name", "Strata")]),
//! );
//! let app = context.create_app(Arc::new(Project { resources }));
//!
//! let strings = app.items(ResourceType::String);
//! assert_eq!(strings.get("app_name")[0].text_value(), Some("Strata"));
//!
//! let id = app.resource_id(ResourceType::String, "app_name");
//! assert_eq!(app.resolve_resource_id(id).unwrap().name, "app_name");
//! ```

pub mod app;
pub mod classgen;
pub mod config;
pub mod context;
pub mod graph;
pub mod ids;
pub mod library;
pub mod model;
pub mod plugin;
pub mod registry;
pub mod symbols;
pub mod visibility;

/// Common imports.
pub mod prelude {
    pub use crate::app::AppRepository;
    pub use crate::classgen::ResourceClassGenerator;
    pub use crate::config::ResourcesConfig;
    pub use crate::context::ResourceContext;
    pub use crate::graph::{RepositoryId, ResourceGraph};
    pub use crate::ids::{CompiledIds, DEFAULT_DYNAMIC_ID_SEED, DynamicIds};
    pub use crate::library::{
        BuildModel, Library, LibraryCache, LibraryLoader, LibraryRepository, ModuleHandle,
    };
    pub use crate::model::{
        ResourceItem, ResourceMap, ResourceTable, ResourceType, ResourceValue, TypedName,
    };
    pub use crate::plugin::{BuildFinished, ResourcesPlugin, SyncSucceeded};
    pub use crate::registry::ClassRegistry;
    pub use crate::symbols::SymbolTable;
    pub use crate::visibility::VisibilityTable;
}
