//! Plugin system for assembling a server.
//!
//! Every layer above the runtime is delivered as a plugin: logging, the
//! resource context, build-model listeners. A plugin inserts its state in
//! `build()`, validates neighbours in `ready()`, reacts to host events in
//! `update()` and releases what it owns in `cleanup()`.
//!
//! # Example
//!
//! ```
//! use strata_system::plugin::{Plugin, PluginId};
//! use strata_system::resource::GlobalResource;
//! use strata_system::server::Server;
//!
//! # struct TracingPlugin;
//! # impl Plugin for TracingPlugin {
//! #     fn build(&self, _server: &mut Server) {}
//! # }
//! struct WatchPlugin {
//!     root: String,
//! }
//!
//! struct WatchRoot(String);
//! impl GlobalResource for WatchRoot {}
//!
//! impl Plugin for WatchPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(WatchRoot(self.root.clone()));
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<TracingPlugin>()]
//!     }
//! }
//!
//! Server::new()
//!     .add_plugins(TracingPlugin)
//!     .add_plugins(WatchPlugin { root: "res".into() })
//!     .finish();
//! ```

mod schedule;

pub use schedule::{IntoScheduleIds, Schedule, ScheduleId};

use core::any::TypeId;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Based on [`TypeId`], so each plugin type has exactly one `PluginId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of server functionality with a managed lifecycle.
///
/// 1. **Build Phase** - `build()` is called in dependency order
/// 2. **Ready Phase** - `ready()` is called in dependency order
/// 3. **Tick Phase** - `update()` is called when a host triggers a schedule
///    the plugin subscribed to
/// 4. **Cleanup Phase** - `cleanup()` is called in reverse dependency order
///
/// # Scheduled Updates
///
/// Hosts signal external events (for example "the build model finished
/// syncing") by ticking a schedule marker type. Only plugins listing that
/// marker in [`tick_schedules()`](Self::tick_schedules) are updated.
///
/// ```ignore
/// pub struct SyncSucceeded;
///
/// impl Plugin for RootsPlugin {
///     fn build(&self, server: &mut Server) { /* ... */ }
///
///     fn tick_schedules(&self) -> Vec<ScheduleId> {
///         vec![ScheduleId::of::<SyncSucceeded>()]
///     }
///
///     fn update(&self, server: &mut Server, schedule: ScheduleId) {
///         // recompute library roots
///     }
/// }
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// Configures the server. Called once when the plugin is built.
    fn build(&self, server: &mut Server);

    /// Called after all plugins have been built.
    ///
    /// Use this to validate that required resources exist or to perform
    /// initialization that depends on other plugins.
    fn ready(&self, _server: &mut Server) {}

    /// Called when a schedule this plugin registered for is triggered.
    ///
    /// Only called if the plugin declared interest via
    /// [`tick_schedules()`](Self::tick_schedules).
    fn update(&self, _server: &mut Server, _schedule: ScheduleId) {}

    /// Called when the server is shutting down, in reverse dependency order.
    fn cleanup(&self, _server: &mut Server) {}

    /// Declares which schedules this plugin wants to receive updates on.
    fn tick_schedules(&self) -> Vec<ScheduleId> {
        Vec::new()
    }

    /// Returns the plugin's name for debugging and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be added before this one.
    ///
    /// The server panics during `finish()` if a dependency is missing.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    ///
    /// Adding a unique plugin type twice panics.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be handed to [`Server::add_plugins`].
///
/// Implemented for every [`Plugin`] and for [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the server.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        let id = PluginId::of::<P>();
        server.add_plugin_boxed(id, Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for boxed in self.plugins {
            server.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins that are usually added together.
///
/// ```ignore
/// pub struct DefaultPlugins;
///
/// impl PluginGroup for DefaultPlugins {
///     fn build(self) -> PluginGroupBuilder {
///         PluginGroupBuilder::new()
///             .add(TracingPlugin::default())
///             .add(ResourcesPlugin::default())
///     }
/// }
/// ```
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with its captured [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

impl BoxedPlugin {
    pub(crate) fn name(&self) -> &str {
        self.plugin.name()
    }
}

/// Builder for customizing plugin groups.
#[derive(Default)]
pub struct PluginGroupBuilder {
    /// The plugins in this group, in order.
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Replaces a plugin of the same type already in the group, or appends it.
    #[must_use]
    pub fn set<P: Plugin>(mut self, plugin: P) -> Self {
        let id = PluginId::of::<P>();
        let boxed = BoxedPlugin {
            id,
            plugin: Box::new(plugin),
        };
        match self.plugins.iter().position(|p| p.id == id) {
            Some(position) => self.plugins[position] = boxed,
            None => self.plugins.push(boxed),
        }
        self
    }

    /// Removes a plugin from the group by type. No-op when absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != id);
        self
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
