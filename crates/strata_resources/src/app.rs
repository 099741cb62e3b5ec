//! Top-level app repository.
//!
//! An [`AppRepository`] is a composite over the module's external libraries
//! followed by the module's own merged resources, so project resources win
//! every same-qualifier collision. On top of the merged view it owns the
//! per-app id tables: compiled ids supplied by a build, and dynamic ids for
//! everything the build has not assigned yet.
//!
//! # Lock order
//!
//! `state` before `aar_libraries`. Graph and registry calls never call back
//! into the app, so they may happen under either lock.

use hashbrown::HashSet;
use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::ResourceContext;
use crate::graph::RepositoryId;
use crate::ids::{CompiledIds, DynamicIds};
use crate::library::{LibraryRepository, ModuleHandle, discover_library_dirs};
use crate::model::{ResourceMap, ResourceTable, ResourceType, TypedName};
use crate::visibility::VisibilityTable;

struct AppState {
    libraries: Vec<Arc<LibraryRepository>>,
    project: RepositoryId,
    /// Built lazily; dropped on every root update.
    visibility: Option<Arc<VisibilityTable>>,
}

struct IdsCache {
    generation: u64,
    ids: Arc<HashSet<String>>,
}

/// Merged resources of a module, its module dependencies and its libraries.
pub struct AppRepository {
    context: ResourceContext,
    module: Arc<dyn ModuleHandle>,
    id: RepositoryId,
    state: RwLock<AppState>,
    /// Libraries with a symbol manifest, most recently matched first.
    aar_libraries: Mutex<VecDeque<Arc<LibraryRepository>>>,
    compiled: RwLock<Arc<CompiledIds>>,
    dynamic: DynamicIds,
    all_ids: Mutex<Option<IdsCache>>,
    disposed: AtomicBool,
}

impl core::fmt::Debug for AppRepository {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppRepository")
            .field("module", &self.module.name())
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl AppRepository {
    /// Composes the libraries discovered for `module` with its project
    /// resources. Prefer [`ResourceContext::create_app`], which also makes
    /// the repository reachable for build events.
    #[must_use]
    pub fn create(context: &ResourceContext, module: Arc<dyn ModuleHandle>) -> Arc<Self> {
        let libraries = compute_libraries(context, module.as_ref());
        let project = module.project_resources();
        let children = child_ids(&libraries, project);
        let id = context
            .graph()
            .add_composite(format!("{} with modules and libraries", module.name()), &children);

        register_packages(context, &libraries);
        let app = Arc::new(Self {
            aar_libraries: Mutex::new(with_symbols(&libraries)),
            state: RwLock::new(AppState {
                libraries,
                project,
                visibility: None,
            }),
            compiled: RwLock::new(Arc::new(CompiledIds::new())),
            dynamic: DynamicIds::with_seed(context.config().dynamic_id_seed),
            all_ids: Mutex::new(None),
            disposed: AtomicBool::new(false),
            context: context.clone(),
            module,
            id,
        });
        tracing::debug!(
            module = app.module.name(),
            repository = %id,
            children = children.len(),
            "app repository created"
        );
        app
    }

    /// Handle of the composite in the context's graph.
    #[must_use]
    pub fn id(&self) -> RepositoryId {
        self.id
    }

    /// The module this repository serves.
    #[must_use]
    pub fn module(&self) -> &Arc<dyn ModuleHandle> {
        &self.module
    }

    /// Libraries currently composed, in child order.
    #[must_use]
    pub fn libraries(&self) -> Vec<Arc<LibraryRepository>> {
        self.state.read().libraries.clone()
    }

    /// Repository holding the module's own merged resources.
    #[must_use]
    pub fn project_resources(&self) -> RepositoryId {
        self.state.read().project
    }

    /// Current children: libraries, then project resources.
    #[must_use]
    pub fn children(&self) -> Vec<RepositoryId> {
        self.context.graph().children(self.id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roots
    // ─────────────────────────────────────────────────────────────────────────

    /// Recomputes libraries from the module's build model and recomposes if
    /// the child list changed. Returns whether it did.
    pub fn update_roots(&self) -> bool {
        let libraries = compute_libraries(&self.context, self.module.as_ref());
        let project = self.module.project_resources();
        self.update_roots_with(libraries, project)
    }

    /// Recomposes over `libraries` followed by `project`.
    ///
    /// An identical child list, order included, changes nothing beyond
    /// dropping the visibility table. Otherwise the children are replaced,
    /// dynamic ids are reset and generated classes for this repository are
    /// discarded.
    pub fn update_roots_with(
        &self,
        libraries: Vec<Arc<LibraryRepository>>,
        project: RepositoryId,
    ) -> bool {
        let children = child_ids(&libraries, project);
        let mut state = self.state.write();
        state.visibility = None;

        if children == self.children() {
            tracing::debug!(module = self.module.name(), "roots unchanged");
            return false;
        }

        *self.aar_libraries.lock() = with_symbols(&libraries);
        register_packages(&self.context, &libraries);
        state.libraries = libraries;
        state.project = project;
        self.context.graph().set_children(self.id, &children);
        self.reset_dynamic_ids();
        drop(state);

        tracing::debug!(
            module = self.module.name(),
            children = children.len(),
            "roots updated"
        );
        true
    }

    /// The composed library whose resource folder lies under `aar_dir`.
    ///
    /// `aar_dir` is expected to be a packaged (`.aar`) or extracted library
    /// folder.
    #[must_use]
    pub fn find_repository_for(&self, aar_dir: &Path) -> Option<Arc<LibraryRepository>> {
        let config = self.context.config();
        debug_assert!(
            aar_dir.to_string_lossy().ends_with(config.aar_suffix.as_str())
                || aar_dir
                    .to_string_lossy()
                    .contains(config.exploded_aar_marker.as_str()),
            "{} is not a library folder",
            aar_dir.display()
        );
        self.state
            .read()
            .libraries
            .iter()
            .find(|library| library.res_dir().starts_with(aar_dir))
            .cloned()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────

    /// Merged items of one type.
    #[must_use]
    pub fn items(&self, ty: ResourceType) -> Arc<ResourceTable> {
        self.context.graph().items(self.id, ty)
    }

    /// Merged items of every type.
    #[must_use]
    pub fn all_items(&self) -> Arc<ResourceMap> {
        self.context.graph().all_items(self.id)
    }

    /// Generation of the merged view.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.context.graph().generation(self.id)
    }

    /// Every id name known to the app: ids declared in library symbol
    /// manifests plus merged [`ResourceType::Id`] items. Recomputed only when
    /// the generation moves.
    #[must_use]
    pub fn all_ids(&self) -> Arc<HashSet<String>> {
        let generation = self.generation();
        let mut cache = self.all_ids.lock();
        if let Some(cached) = cache.as_ref().filter(|c| c.generation == generation) {
            return Arc::clone(&cached.ids);
        }

        let mut ids: HashSet<String> = HashSet::new();
        for library in self.libraries() {
            ids.extend(library.declared_ids().map(ToString::to_string));
        }
        ids.extend(self.items(ResourceType::Id).names().map(ToString::to_string));

        let ids = Arc::new(ids);
        *cache = Some(IdsCache {
            generation,
            ids: Arc::clone(&ids),
        });
        ids
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Visibility
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true if `(ty, name)` is private to the library declaring it.
    ///
    /// Always false for modules without a build model.
    #[must_use]
    pub fn is_private(&self, ty: ResourceType, name: &str) -> bool {
        self.visibility_table()
            .is_some_and(|table| table.is_private(ty, name))
    }

    /// The visibility table for the current variant, or
    /// [`VisibilityTable::NONE`] without a build model.
    #[must_use]
    pub fn visibility(&self) -> Arc<VisibilityTable> {
        self.visibility_table()
            .unwrap_or_else(|| Arc::new(VisibilityTable::NONE))
    }

    fn visibility_table(&self) -> Option<Arc<VisibilityTable>> {
        if !self.module.requires_build_model() {
            return None;
        }
        // Can be missing mid-sync.
        let model = self.module.build_model()?;

        let state = self.state.upgradable_read();
        if let Some(table) = state
            .visibility
            .as_ref()
            .filter(|table| table.variant() == model.variant)
        {
            return Some(Arc::clone(table));
        }

        let table = Arc::new(VisibilityTable::build(model.variant, &state.libraries));
        tracing::debug!(
            module = self.module.name(),
            variant = table.variant(),
            private = table.private_count(),
            "visibility table built"
        );
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.visibility = Some(Arc::clone(&table));
        Some(table)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ids
    // ─────────────────────────────────────────────────────────────────────────

    /// Id of `(ty, name)`: the compiled id if the last build assigned one,
    /// otherwise a dynamic id, allocated on first request.
    #[must_use]
    pub fn resource_id(&self, ty: ResourceType, name: &str) -> i32 {
        if let Some(id) = self.compiled.read().id(ty, name) {
            return id;
        }
        self.dynamic.get_or_allocate(ty, name)
    }

    /// Resource owning `id`, compiled ids first.
    #[must_use]
    pub fn resolve_resource_id(&self, id: i32) -> Option<TypedName> {
        if let Some(name) = self.compiled.read().resolve(id) {
            return Some(name.clone());
        }
        self.dynamic.resolve(id)
    }

    /// Styleable whose compiled attribute ids are exactly `ids`.
    #[must_use]
    pub fn resolve_styleable(&self, ids: &[i32]) -> Option<String> {
        self.compiled.read().styleable(ids).map(ToString::to_string)
    }

    /// Attribute ids of styleable `name`, in the order of `attrs`, taken from
    /// the first library symbol manifest that declares it.
    ///
    /// The matching library moves to the front of the scan order. Merge order
    /// is unaffected.
    #[must_use]
    pub fn declared_array_values(&self, attrs: &[String], name: &str) -> Option<Vec<i32>> {
        let mut libraries = self.aar_libraries.lock();
        let (index, values) = libraries.iter().enumerate().find_map(|(index, library)| {
            library
                .symbols()?
                .declared_styleable(name, attrs)
                .map(|values| (index, values))
        })?;
        if index > 0
            && let Some(library) = libraries.remove(index)
        {
            libraries.push_front(library);
        }
        Some(values)
    }

    /// Libraries with a symbol manifest in their current scan order.
    #[must_use]
    pub fn symbol_libraries(&self) -> Vec<Arc<LibraryRepository>> {
        self.aar_libraries.lock().iter().cloned().collect()
    }

    /// Replaces the compiled id tables, then resets dynamic ids.
    pub fn set_compiled_ids(&self, ids: CompiledIds) {
        *self.compiled.write() = Arc::new(ids);
        self.reset_dynamic_ids();
        tracing::debug!(module = self.module.name(), "compiled ids replaced");
    }

    /// Forgets all dynamic ids and the classes generated from them.
    ///
    /// Ids are reset before generators are dropped, so a generator created
    /// concurrently never outlives the ids it was built from.
    pub fn reset_dynamic_ids(&self) {
        self.clear_dynamic_ids();
        self.context.registry().clear_for(self.id);
    }

    /// Forgets dynamic ids without touching the class registry.
    pub(crate) fn clear_dynamic_ids(&self) {
        self.dynamic.reset();
    }

    /// Number of live dynamic ids.
    #[must_use]
    pub fn dynamic_id_count(&self) -> usize {
        self.dynamic.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true once [`dispose`](Self::dispose) ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Deregisters from every child and releases cached state. Children are
    /// shared and survive. Calling it twice is a no-op.
    pub fn dispose(&self) {
        if self.release() {
            self.context.forget_app(self.id);
        }
    }

    fn release(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.context.registry().clear_for(self.id);
        let graph = self.context.graph();
        if graph.parents(self.id).is_empty() {
            graph.remove(self.id);
        } else {
            tracing::warn!(repository = %self.id, "app repository still composed elsewhere");
        }
        *self.all_ids.lock() = None;
        tracing::debug!(module = self.module.name(), "app repository disposed");
        true
    }
}

impl Drop for AppRepository {
    fn drop(&mut self) {
        self.release();
    }
}

fn compute_libraries(
    context: &ResourceContext,
    module: &dyn ModuleHandle,
) -> Vec<Arc<LibraryRepository>> {
    let cache = context.libraries();
    discover_library_dirs(module, cache.loader(), context.config())
        .iter()
        .map(|dir| cache.get(dir))
        .collect()
}

fn child_ids(libraries: &[Arc<LibraryRepository>], project: RepositoryId) -> Vec<RepositoryId> {
    libraries
        .iter()
        .map(|library| library.id())
        .chain(core::iter::once(project))
        .collect()
}

fn with_symbols(libraries: &[Arc<LibraryRepository>]) -> VecDeque<Arc<LibraryRepository>> {
    libraries
        .iter()
        .filter(|library| library.symbols().is_some())
        .cloned()
        .collect()
}

fn register_packages(context: &ResourceContext, libraries: &[Arc<LibraryRepository>]) {
    for package in libraries.iter().filter_map(|library| library.package()) {
        context.registry().add_package(package);
    }
}
