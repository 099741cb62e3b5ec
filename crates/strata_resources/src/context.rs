//! Process-wide resource context.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use strata_system::resource::GlobalResource;

use crate::app::AppRepository;
use crate::config::ResourcesConfig;
use crate::graph::{RepositoryId, ResourceGraph};
use crate::library::{LibraryCache, LibraryLoader, ModuleHandle};
use crate::registry::ClassRegistry;

struct ContextInner {
    graph: Arc<ResourceGraph>,
    libraries: LibraryCache,
    registry: ClassRegistry,
    config: ResourcesConfig,
    apps: Mutex<Vec<Weak<AppRepository>>>,
}

/// Shared state of every app repository in a project scope.
///
/// Cloning is cheap; all clones see the same graph, library cache and class
/// registry. The context only holds app repositories weakly: an app that is
/// dropped or disposed stops receiving root updates.
///
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use strata_resources::context::ResourceContext;
/// use strata_resources::library::LibraryLoader;
/// use strata_resources::model::ResourceMap;
///
/// struct NoLibraries;
/// impl LibraryLoader for NoLibraries {
///     fn load_items(&self, _res_dir: &Path) -> ResourceMap {
///         ResourceMap::new()
///     }
/// }
///
/// let context = ResourceContext::new(Arc::new(NoLibraries));
/// assert!(context.apps().is_empty());
/// assert!(context.graph().is_empty());
/// ```
#[derive(Clone)]
pub struct ResourceContext {
    inner: Arc<ContextInner>,
}

impl GlobalResource for ResourceContext {}

impl core::fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceContext")
            .field("graph", &self.inner.graph)
            .field("libraries", &self.inner.libraries)
            .field("apps", &self.inner.apps.lock().len())
            .finish_non_exhaustive()
    }
}

impl ResourceContext {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new(loader: Arc<dyn LibraryLoader>) -> Self {
        Self::with_config(loader, ResourcesConfig::default())
    }

    /// Creates a context with `config`.
    #[must_use]
    pub fn with_config(loader: Arc<dyn LibraryLoader>, config: ResourcesConfig) -> Self {
        let graph = Arc::new(ResourceGraph::new());
        Self {
            inner: Arc::new(ContextInner {
                libraries: LibraryCache::new(Arc::clone(&graph), loader, config.clone()),
                registry: ClassRegistry::new(),
                apps: Mutex::new(Vec::new()),
                graph,
                config,
            }),
        }
    }

    /// The repository graph.
    #[must_use]
    pub fn graph(&self) -> &Arc<ResourceGraph> {
        &self.inner.graph
    }

    /// Libraries loaded so far.
    #[must_use]
    pub fn libraries(&self) -> &LibraryCache {
        &self.inner.libraries
    }

    /// The class-definition registry.
    #[must_use]
    pub fn registry(&self) -> &ClassRegistry {
        &self.inner.registry
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &ResourcesConfig {
        &self.inner.config
    }

    /// Creates an app repository for `module` and tracks it for root updates.
    pub fn create_app(&self, module: Arc<dyn ModuleHandle>) -> Arc<AppRepository> {
        let app = AppRepository::create(self, module);
        self.inner.apps.lock().push(Arc::downgrade(&app));
        app
    }

    /// Live app repositories, in creation order.
    #[must_use]
    pub fn apps(&self) -> Vec<Arc<AppRepository>> {
        let mut apps = self.inner.apps.lock();
        apps.retain(|app| app.strong_count() > 0);
        apps.iter()
            .filter_map(Weak::upgrade)
            .filter(|app| !app.is_disposed())
            .collect()
    }

    /// Runs [`AppRepository::update_roots`] on every live app. Returns how
    /// many changed.
    pub fn update_roots(&self) -> usize {
        let apps = self.apps();
        let changed = apps.iter().filter(|app| app.update_roots()).count();
        tracing::debug!(apps = apps.len(), changed, "roots refreshed");
        changed
    }

    /// Bytecode of an accessor class generated from `app`.
    pub fn find_class_definition(&self, name: &str, app: &Arc<AppRepository>) -> Option<Arc<[u8]>> {
        self.inner.registry.find_class_definition(name, app)
    }

    /// Drops every class generator and resets the dynamic ids of every live
    /// app, so classes generated afterwards agree with fresh allocations.
    pub fn clear_class_definitions(&self) {
        // Ids first: a generator built in between is dropped below.
        for app in self.apps() {
            app.clear_dynamic_ids();
        }
        self.inner.registry.clear();
        tracing::debug!("class definitions cleared");
    }

    /// Disposes every live app repository.
    pub fn dispose_apps(&self) {
        for app in self.apps() {
            app.dispose();
        }
    }

    pub(crate) fn forget_app(&self, id: RepositoryId) {
        self.inner
            .apps
            .lock()
            .retain(|app| app.upgrade().is_some_and(|app| app.id() != id));
    }
}
