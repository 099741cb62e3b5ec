//! Server runtime for plugin orchestration.
//!
//! The [`Server`] owns every plugin and the process-wide state they expose.
//! Hosts create one server per project scope, add plugins, call
//! [`finish()`](Server::finish), forward external events with
//! [`tick()`](Server::tick) and call [`cleanup()`](Server::cleanup) when the
//! scope is disposed.
//!
//! Global resources live as long as the server and are handed out by shared
//! reference only.
//!
//! # Lifecycle
//!
//! 1. **Dependency Resolution** - validate and topologically sort plugins
//! 2. **Build Phase** - call `plugin.build()` in dependency order
//! 3. **Ready Phase** - call `plugin.ready()` in dependency order
//! 4. **Ticks** - hosts trigger schedules, subscribed plugins get `update()`
//! 5. **Cleanup Phase** - call `plugin.cleanup()` in reverse order

use crate::plugin::{Plugin, PluginId, Plugins, ScheduleId};
use crate::resource::{GlobalResource, Resources};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Build progress of the server: `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    Building,
    Built,
}

/// The runtime that orchestrates plugins and manages resources.
///
/// ```ignore
/// use strata_system::server::Server;
///
/// let mut server = Server::new();
/// server
///     .add_plugins(TracingPlugin::default())
///     .add_plugins(ResourcesPlugin::default());
/// server.finish();
/// server.tick::<SyncSucceeded>();
/// server.cleanup();
/// ```
pub struct Server {
    /// Read-only, server-lifetime resources.
    global: Resources,

    /// Plugins pending build (not yet sorted).
    pending_plugins: Vec<PluginEntry>,

    /// Plugins that have been built, in dependency order.
    built_plugins: Vec<PluginEntry>,

    /// Plugin IDs that have been added, for duplicate detection.
    plugin_ids: HashSet<PluginId>,

    /// Maps schedule → indices into `built_plugins`, in dependency order.
    schedule_registry: HashMap<ScheduleId, Vec<usize>>,

    build_state: BuildState,
}

struct PluginEntry {
    id: PluginId,
    plugin: Arc<dyn Plugin>,
    /// Cached for dependency lookup and error messages.
    name: String,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a new empty server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Resources::new(),
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            schedule_registry: HashMap::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds one plugin or a [`PluginGroupBuilder`](crate::plugin::PluginGroupBuilder).
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry {
            id,
            plugin: Arc::from(plugin),
            name,
        };

        // Plugins added while building are built immediately.
        if self.build_state == BuildState::Building {
            let plugin = Arc::clone(&entry.plugin);
            plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a global resource, returning the value it replaced.
    ///
    /// Global resources are the process-wide context objects of a server:
    /// configuration, registries and the handles that own shared caches.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns true if a global resource of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Gets an immutable reference to a global resource.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<&R> {
        self.global.get::<R>().ok()
    }

    /// Removes a global resource and returns it.
    ///
    /// Used by plugins that tear down their context in `cleanup()`.
    pub fn remove_global<R: GlobalResource>(&mut self) -> Option<R> {
        self.global.remove::<R>()
    }

    /// Returns a reference to the global resources container.
    #[must_use]
    pub fn global_resources(&self) -> &Resources {
        &self.global
    }

    /// Returns whether `finish()` has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ticks
    // ─────────────────────────────────────────────────────────────────────────

    /// Triggers a tick for the given schedule marker type.
    ///
    /// Only plugins that declared interest in this schedule via
    /// [`Plugin::tick_schedules()`] have [`Plugin::update()`] called, in
    /// dependency order.
    pub fn tick<S: 'static>(&mut self) {
        self.tick_schedule(ScheduleId::of::<S>());
    }

    /// Non-generic version of [`tick()`](Self::tick).
    pub fn tick_schedule(&mut self, schedule: ScheduleId) {
        let Some(indices) = self.schedule_registry.get(&schedule) else {
            return;
        };
        let plugins: Vec<Arc<dyn Plugin>> = indices
            .iter()
            .map(|&idx| Arc::clone(&self.built_plugins[idx].plugin))
            .collect();

        for plugin in plugins {
            plugin.update(self, schedule);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds all plugins and prepares the server for ticks.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not satisfied
    /// - If there is a circular dependency between plugins
    /// - If called more than once
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("Server::finish() was already called. Cannot build twice.");
        }

        let sorted_plugins = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted_plugins {
            let plugin = Arc::clone(&entry.plugin);
            plugin.build(self);
            self.built_plugins.push(entry);
        }

        for plugin in self.built_snapshot() {
            plugin.ready(self);
        }

        self.build_schedule_registry();
        self.build_state = BuildState::Built;
    }

    /// Cleans up all plugins in reverse dependency order.
    pub fn cleanup(&mut self) {
        for plugin in self.built_snapshot().into_iter().rev() {
            plugin.cleanup(self);
        }
    }

    fn built_snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.built_plugins
            .iter()
            .map(|entry| Arc::clone(&entry.plugin))
            .collect()
    }

    fn build_schedule_registry(&mut self) {
        self.schedule_registry.clear();
        for (idx, entry) in self.built_plugins.iter().enumerate() {
            for schedule in entry.plugin.tick_schedules() {
                self.schedule_registry
                    .entry(schedule)
                    .or_default()
                    .push(idx);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Sorts pending plugins by dependencies (Kahn's algorithm).
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not found
    /// - If there is a circular dependency
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        if pending.is_empty() {
            return Vec::new();
        }

        let id_to_index: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();

        let n = pending.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep_id in entry.plugin.dependencies() {
                let dep_name = dep_id.type_name();
                if let Some(&dep_idx) = id_to_index.get(&dep_id) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.id == dep_id) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name, dep_name, dep_name, entry.name
                    );
                }
            }
        }

        // Seed in reverse so that independent plugins keep insertion order.
        let mut queue: Vec<usize> = (0..n).rev().filter(|&i| in_degree[i] == 0).collect();
        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted_indices.push(idx);
            for &dependent_idx in dependents[idx].iter().rev() {
                in_degree[dependent_idx] -= 1;
                if in_degree[dependent_idx] == 0 {
                    queue.push(dependent_idx);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| pending[i].name.as_str())
                .collect();

            panic!(
                "Circular dependency detected among plugins: {:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin.",
                in_cycle
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
