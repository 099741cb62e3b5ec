//! # Strata Internal Library
//!
//! Re-exports the core Strata crates for convenience.

use std::sync::Arc;

/// Layer 1: plugin runtime and resource container.
pub use strata_system;

/// Class-file writer used for accessor classes.
pub use strata_classfile;

/// Layer 2: resource repositories, id tables and class registry.
pub use strata_resources;

/// Logging infrastructure plugins.
pub use strata_core_plugins;

use strata_core_plugins::TracingPlugin;
use strata_resources::library::LibraryLoader;
use strata_resources::plugin::ResourcesPlugin;
use strata_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Logging plus the resource layer over `loader`.
///
/// ```no_run
/// # use std::path::Path;
/// # use std::sync::Arc;
/// # use strata_internal::strata_resources::library::LibraryLoader;
/// # use strata_internal::strata_resources::model::ResourceMap;
/// use strata_internal::DefaultPlugins;
/// use strata_internal::strata_system::plugin::PluginGroup;
/// use strata_internal::strata_system::server::Server;
///
/// # struct Disk;
/// # impl LibraryLoader for Disk {
/// #     fn load_items(&self, _res_dir: &Path) -> ResourceMap { ResourceMap::new() }
/// # }
/// Server::new()
///     .add_plugins(DefaultPlugins::new(Arc::new(Disk)).build())
///     .finish();
/// ```
///
/// Swap the resource configuration with
/// `.build().set(ResourcesPlugin::new(loader).with_config(config))`.
pub struct DefaultPlugins {
    loader: Arc<dyn LibraryLoader>,
}

impl DefaultPlugins {
    /// Bundles the default plugins around `loader`.
    #[must_use]
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self { loader }
    }
}

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TracingPlugin::default())
            .add(ResourcesPlugin::new(self.loader))
    }
}

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::DefaultPlugins;
    pub use strata_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
    pub use strata_resources::prelude::*;
    pub use strata_system::prelude::*;
}
