//! Class-definition registry.

use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::app::AppRepository;
use crate::classgen::ResourceClassGenerator;
use crate::graph::RepositoryId;

/// Maps app repositories to their class generators.
///
/// Only packages registered through [`add_package`](Self::add_package) are
/// served; those are the packages of composed libraries whose manifest could
/// be read.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    packages: RwLock<HashSet<String>>,
    generators: Mutex<HashMap<RepositoryId, Arc<ResourceClassGenerator>>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a library package. Returns false if it was already known.
    pub fn add_package(&self, package: impl Into<String>) -> bool {
        let package = package.into();
        if self.packages.read().contains(&package) {
            return false;
        }
        tracing::debug!(package = %package, "library package registered");
        self.packages.write().insert(package)
    }

    /// Returns true if classes of `package` are served.
    #[must_use]
    pub fn contains_package(&self, package: &str) -> bool {
        self.packages.read().contains(package)
    }

    /// Registered packages, sorted.
    #[must_use]
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = self.packages.read().iter().cloned().collect();
        packages.sort();
        packages
    }

    /// Bytecode of `name` generated from `app`, or `None` if `name` is not an
    /// accessor class of a registered package.
    ///
    /// Accepted shapes are `<package>.R` and `<package>.R$<type>`.
    pub fn find_class_definition(&self, name: &str, app: &Arc<AppRepository>) -> Option<Arc<[u8]>> {
        let package = accessor_package(name)?;
        if !self.contains_package(package) {
            return None;
        }

        let generator = Arc::clone(
            self.generators
                .lock()
                .entry(app.id())
                .or_insert_with(|| Arc::new(ResourceClassGenerator::new(app))),
        );
        match generator.generate(name) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(class = name, error = %err, "cannot generate class");
                None
            }
        }
    }

    /// Drops every generator.
    pub fn clear(&self) {
        self.generators.lock().clear();
    }

    /// Drops the generator of one app repository.
    pub fn clear_for(&self, app: RepositoryId) {
        if self.generators.lock().remove(&app).is_some() {
            tracing::debug!(repository = %app, "class generator dropped");
        }
    }

    /// Number of live generators.
    #[must_use]
    pub fn generator_count(&self) -> usize {
        self.generators.lock().len()
    }
}

/// Package of an accessor class name: the part before the last `.`, when
/// what follows is `R` alone or `R$...`.
fn accessor_package(name: &str) -> Option<&str> {
    let index = name.rfind('.')?;
    if index <= 1 {
        return None;
    }
    let simple = &name[index + 1..];
    let rest = simple.strip_prefix('R')?;
    (rest.is_empty() || rest.starts_with('$')).then(|| &name[..index])
}
