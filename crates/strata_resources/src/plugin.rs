//! Server integration.
//!
//! [`ResourcesPlugin`] registers the [`ResourceContext`] and
//! [`ResourcesConfig`] globals and refreshes every live app repository when
//! the host reports a finished sync or build:
//!
//! ```
//! # use std::path::Path;
//! # use std::sync::Arc;
//! # use strata_resources::library::LibraryLoader;
//! # use strata_resources::model::ResourceMap;
//! use strata_resources::context::ResourceContext;
//! use strata_resources::plugin::{ResourcesPlugin, SyncSucceeded};
//! use strata_system::server::Server;
//!
//! # struct Disk;
//! # impl LibraryLoader for Disk {
//! #     fn load_items(&self, _res_dir: &Path) -> ResourceMap { ResourceMap::new() }
//! # }
//! let mut server = Server::new();
//! server.add_plugins(ResourcesPlugin::new(Arc::new(Disk)));
//! server.finish();
//!
//! assert!(server.contains_global::<ResourceContext>());
//! server.tick::<SyncSucceeded>();
//! server.cleanup();
//! ```

use std::sync::Arc;
use strata_system::plugin::{IntoScheduleIds, Plugin, Schedule, ScheduleId};
use strata_system::server::Server;

use crate::config::ResourcesConfig;
use crate::context::ResourceContext;
use crate::library::LibraryLoader;

/// Tick schedule: a build-model sync completed.
pub struct SyncSucceeded;
impl Schedule for SyncSucceeded {}

/// Tick schedule: a project build completed. Extracted libraries may have
/// appeared since the last sync.
pub struct BuildFinished;
impl Schedule for BuildFinished {}

/// Provides the resource layer.
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`ResourceContext`] | Global | Graph, library cache, class registry, live apps |
/// | [`ResourcesConfig`] | Global | Configuration (read-only) |
pub struct ResourcesPlugin {
    loader: Arc<dyn LibraryLoader>,
    config: ResourcesConfig,
}

impl ResourcesPlugin {
    /// Creates the plugin with the default configuration.
    #[must_use]
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            loader,
            config: ResourcesConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ResourcesConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the dynamic id seed.
    #[must_use]
    pub fn with_dynamic_id_seed(mut self, seed: i32) -> Self {
        self.config.dynamic_id_seed = seed;
        self
    }
}

impl Plugin for ResourcesPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(self.config.clone());
        server.insert_global(ResourceContext::with_config(
            Arc::clone(&self.loader),
            self.config.clone(),
        ));
    }

    fn tick_schedules(&self) -> Vec<ScheduleId> {
        <(SyncSucceeded, BuildFinished)>::schedule_ids()
    }

    fn update(&self, server: &mut Server, schedule: ScheduleId) {
        let Some(context) = server.get_global::<ResourceContext>().cloned() else {
            return;
        };
        let changed = context.update_roots();
        tracing::debug!(schedule = schedule.type_name(), changed, "build event handled");
    }

    fn cleanup(&self, server: &mut Server) {
        if let Some(context) = server.get_global::<ResourceContext>() {
            context.dispose_apps();
        }
        tracing::debug!("resources plugin cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceMap;
    use std::path::Path;

    struct Empty;

    impl LibraryLoader for Empty {
        fn load_items(&self, _res_dir: &Path) -> ResourceMap {
            ResourceMap::new()
        }
    }

    #[test]
    fn registers_globals_with_config() {
        let mut server = Server::new();
        server.add_plugins(ResourcesPlugin::new(Arc::new(Empty)).with_dynamic_id_seed(0x7e00_0000));
        server.finish();

        assert_eq!(
            server.get_global::<ResourcesConfig>().unwrap().dynamic_id_seed,
            0x7e00_0000
        );
        let context = server.get_global::<ResourceContext>().unwrap();
        assert_eq!(context.config().dynamic_id_seed, 0x7e00_0000);
    }

    #[test]
    fn subscribes_to_build_events() {
        let plugin = ResourcesPlugin::new(Arc::new(Empty));
        assert_eq!(
            plugin.tick_schedules(),
            vec![
                ScheduleId::of::<SyncSucceeded>(),
                ScheduleId::of::<BuildFinished>()
            ]
        );
    }
}
