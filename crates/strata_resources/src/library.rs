//! Library discovery and loading.
//!
//! A module reports the libraries its build depends on through
//! [`ModuleHandle`]. [`discover_library_dirs`] turns that into a stable,
//! sorted list of resource folders, and [`LibraryCache`] loads each folder
//! once into a leaf repository shared by every app repository that uses it.
//!
//! An extracted library looks like this on disk:
//!
//! ```text
//! appcompat-v7.aar/
//!   AndroidManifest.xml   package name, used for class lookup
//!   R.txt                 symbol manifest
//!   public.txt            optional list of public resources
//!   res/                  resource folder, parsed by the LibraryLoader
//! ```

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ResourcesConfig;
use crate::graph::{RepositoryId, ResourceGraph};
use crate::model::{ResourceMap, ResourceType, TypedName};
use crate::symbols::SymbolTable;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure to read a library's package name.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("cannot read manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The manifest has no `package` attribute.
    #[error("manifest {path} declares no package")]
    MissingPackage {
        /// Manifest path.
        path: PathBuf,
    },
}

/// Failure to read a library's optional metadata files.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A metadata file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A public list line is not `<type> <name>`.
    #[error("{path}:{line}: malformed public resource entry")]
    MalformedPublicEntry {
        /// File path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Build model
// ─────────────────────────────────────────────────────────────────────────────

/// A library dependency as reported by the build model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    /// Gradle-style project path (`:lib:core`) when the library is a module of
    /// the same project.
    pub project: Option<String>,
    /// Folder of the extracted library.
    pub folder: PathBuf,
    /// Resource folder inside it.
    pub res_folder: PathBuf,
    /// Libraries this one depends on.
    pub dependencies: Vec<Library>,
}

impl Library {
    /// An external library extracted to `folder`, with resources in `folder/res`.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        Self {
            project: None,
            res_folder: folder.join("res"),
            folder,
            dependencies: Vec::new(),
        }
    }

    /// Marks the library as provided by the project module at `path`.
    #[must_use]
    pub fn with_project(mut self, path: impl Into<String>) -> Self {
        self.project = Some(path.into());
        self
    }

    /// Overrides the resource folder.
    #[must_use]
    pub fn with_res_folder(mut self, res_folder: impl Into<PathBuf>) -> Self {
        self.res_folder = res_folder.into();
        self
    }

    /// Adds a transitive dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Library) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Resolved build state of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildModel {
    /// Selected build variant.
    pub variant: String,
    /// Direct library dependencies of the main artifact.
    pub libraries: Vec<Library>,
}

/// A project module as seen by the resource layer.
pub trait ModuleHandle: Send + Sync {
    /// Module name.
    fn name(&self) -> &str;

    /// Current build model, if the last sync produced one.
    fn build_model(&self) -> Option<BuildModel>;

    /// Whether this module is configured through a build model at all.
    /// Modules that are not never consult [`build_model`](Self::build_model).
    fn requires_build_model(&self) -> bool {
        true
    }

    /// All modules this one depends on, transitively.
    fn dependencies(&self) -> Vec<Arc<dyn ModuleHandle>>;

    /// Resource folders of libraries known to the IDE project model.
    /// Consulted only when no build model is available.
    fn ide_library_folders(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Repository holding the merged resources of this module and its
    /// module dependencies.
    fn project_resources(&self) -> RepositoryId;
}

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

/// Resource folders of every external library `module` depends on, sorted.
///
/// With a build model, libraries of the module and of all its dependencies
/// are flattened together with their own dependencies. Libraries backed by a
/// project module are skipped, as is any library whose name is already taken
/// by a module or an earlier library, or whose resource folder is missing.
/// Without a build model the IDE library folders are used as-is.
pub fn discover_library_dirs(
    module: &dyn ModuleHandle,
    loader: &dyn LibraryLoader,
    config: &ResourcesConfig,
) -> Vec<PathBuf> {
    let dependencies = module.dependencies();

    let model = if module.requires_build_model() {
        module.build_model()
    } else {
        None
    };
    let Some(model) = model else {
        let mut dirs: HashSet<PathBuf> = module.ide_library_folders().into_iter().collect();
        for dependency in &dependencies {
            dirs.extend(dependency.ide_library_folders());
        }
        let mut dirs: Vec<PathBuf> = dirs.into_iter().collect();
        dirs.sort();
        return dirs;
    };

    let models: Vec<BuildModel> = core::iter::once(model)
        .chain(dependencies.iter().filter_map(|m| m.build_model()))
        .collect();
    let mut libraries = Vec::new();
    for model in &models {
        let mut unique = HashSet::new();
        for library in &model.libraries {
            flatten(library, &mut unique, &mut libraries);
        }
    }

    let mut names: HashSet<String> = dependencies.iter().map(|m| m.name().to_string()).collect();
    let mut dirs = HashSet::new();
    for library in libraries {
        if let Some(project) = library.project.as_deref().filter(|p| !p.is_empty()) {
            let name = project.rsplit(':').next().unwrap_or(project);
            names.insert(name.to_string());
            continue;
        }
        let Some(name) = library_name(library, config) else {
            continue;
        };
        if !names.contains(&name) && loader.exists(&library.res_folder) {
            dirs.insert(library.res_folder.clone());
            names.insert(name);
        }
    }

    let mut dirs: Vec<PathBuf> = dirs.into_iter().collect();
    dirs.sort();
    dirs
}

fn flatten<'a>(library: &'a Library, unique: &mut HashSet<&'a Path>, out: &mut Vec<&'a Library>) {
    if !unique.insert(library.folder.as_path()) {
        return;
    }
    out.push(library);
    for dependency in &library.dependencies {
        flatten(dependency, unique, out);
    }
}

/// `foo.aar` is named `foo`; `exploded-aar/group/foo/1.0` is named after
/// the version folder's parent.
fn library_name(library: &Library, config: &ResourcesConfig) -> Option<String> {
    let folder = &library.folder;
    let name = folder.file_name()?.to_str()?;
    if let Some(stem) = name.strip_suffix(config.aar_suffix.as_str()) {
        return Some(stem.to_string());
    }
    if folder.to_string_lossy().contains(config.exploded_aar_marker.as_str()) {
        return folder
            .parent()?
            .file_name()?
            .to_str()
            .map(ToString::to_string);
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Access to library contents on disk.
///
/// Only [`load_items`](Self::load_items) has no default: parsing resource
/// folders belongs to the host.
pub trait LibraryLoader: Send + Sync {
    /// Parses a resource folder.
    fn load_items(&self, res_dir: &Path) -> ResourceMap;

    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Reads a metadata file.
    ///
    /// # Errors
    ///
    /// Any I/O error, including a missing file.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// A library loaded into the graph, with the metadata read next to it.
#[derive(Debug)]
pub struct LibraryRepository {
    res_dir: PathBuf,
    id: RepositoryId,
    symbols: Option<Arc<SymbolTable>>,
    public: Option<HashSet<TypedName>>,
    package: Option<String>,
}

impl LibraryRepository {
    /// Resource folder the library was loaded from.
    #[must_use]
    pub fn res_dir(&self) -> &Path {
        &self.res_dir
    }

    /// Leaf repository holding the library's items.
    #[must_use]
    pub fn id(&self) -> RepositoryId {
        self.id
    }

    /// Parsed symbol manifest, if the library ships one.
    #[must_use]
    pub fn symbols(&self) -> Option<&Arc<SymbolTable>> {
        self.symbols.as_ref()
    }

    /// Resources the library declares public, if it publishes a list.
    #[must_use]
    pub fn public_resources(&self) -> Option<&HashSet<TypedName>> {
        self.public.as_ref()
    }

    /// Declared package, if the manifest could be read.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Ids declared in the symbol manifest.
    pub fn declared_ids(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .flat_map(|symbols| symbols.names(ResourceType::Id))
    }
}

/// One shared [`LibraryRepository`] per resource folder.
pub struct LibraryCache {
    graph: Arc<ResourceGraph>,
    loader: Arc<dyn LibraryLoader>,
    config: ResourcesConfig,
    entries: Mutex<HashMap<PathBuf, Arc<LibraryRepository>>>,
}

impl core::fmt::Debug for LibraryCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LibraryCache")
            .field("libraries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl LibraryCache {
    /// Creates an empty cache loading into `graph`.
    #[must_use]
    pub fn new(
        graph: Arc<ResourceGraph>,
        loader: Arc<dyn LibraryLoader>,
        config: ResourcesConfig,
    ) -> Self {
        Self {
            graph,
            loader,
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The loader used for every library.
    #[must_use]
    pub fn loader(&self) -> &dyn LibraryLoader {
        self.loader.as_ref()
    }

    /// Returns the library for `res_dir`, loading it on first use.
    pub fn get(&self, res_dir: &Path) -> Arc<LibraryRepository> {
        if let Some(library) = self.entries.lock().get(res_dir) {
            return Arc::clone(library);
        }

        // Loading happens outside the lock; a racing load of the same folder
        // loses and its leaf is dropped again.
        let loaded = Arc::new(self.load(res_dir));
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(res_dir) {
            let existing = Arc::clone(existing);
            drop(entries);
            self.graph.remove(loaded.id);
            return existing;
        }
        entries.insert(res_dir.to_path_buf(), Arc::clone(&loaded));
        loaded
    }

    /// Returns the library for `res_dir` if it has been loaded.
    #[must_use]
    pub fn peek(&self, res_dir: &Path) -> Option<Arc<LibraryRepository>> {
        self.entries.lock().get(res_dir).cloned()
    }

    /// Re-parses a loaded library's items and notifies every repository
    /// built on it. Returns false if the folder was never loaded.
    pub fn reload(&self, res_dir: &Path) -> bool {
        let Some(library) = self.peek(res_dir) else {
            return false;
        };
        let items = self.loader.load_items(res_dir);
        self.graph.update_leaf(library.id, &[], |map| *map = items);
        tracing::debug!(library = %res_dir.display(), "library reloaded");
        true
    }

    /// Number of loaded libraries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn load(&self, res_dir: &Path) -> LibraryRepository {
        let items = self.loader.load_items(res_dir);
        let id = self.graph.add_leaf(res_dir.display().to_string(), items);
        let root = res_dir.parent().unwrap_or(res_dir);

        let symbols = self
            .read_optional(&root.join(&self.config.symbol_file))
            .map(|text| Arc::new(SymbolTable::parse(&text)));

        let public = match self.read_public(&root.join(&self.config.public_file)) {
            Ok(public) => public,
            Err(err) => {
                tracing::warn!(library = %res_dir.display(), error = %err, "ignoring public resource list");
                None
            }
        };

        let package = match self.read_package(&root.join(&self.config.manifest_file)) {
            Ok(package) => Some(package),
            Err(err) => {
                tracing::warn!(library = %res_dir.display(), error = %err, "library package unknown");
                None
            }
        };

        tracing::debug!(
            library = %res_dir.display(),
            repository = %id,
            symbols = symbols.is_some(),
            package = package.as_deref().unwrap_or("-"),
            "library loaded"
        );
        LibraryRepository {
            res_dir: res_dir.to_path_buf(),
            id,
            symbols,
            public,
            package,
        }
    }

    fn read_optional(&self, path: &Path) -> Option<String> {
        if !self.loader.exists(path) {
            return None;
        }
        match self.loader.read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read library file");
                None
            }
        }
    }

    fn read_public(&self, path: &Path) -> Result<Option<HashSet<TypedName>>, LibraryError> {
        if !self.loader.exists(path) {
            return Ok(None);
        }
        let text = self
            .loader
            .read_to_string(path)
            .map_err(|source| LibraryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        parse_public_list(&text)
            .map(Some)
            .map_err(|line| LibraryError::MalformedPublicEntry {
                path: path.to_path_buf(),
                line,
            })
    }

    /// Reads the package declared by a library manifest.
    ///
    /// # Errors
    ///
    /// [`ManifestError::Io`] if the manifest cannot be read and
    /// [`ManifestError::MissingPackage`] if it declares none.
    pub fn read_package(&self, manifest: &Path) -> Result<String, ManifestError> {
        let text = self
            .loader
            .read_to_string(manifest)
            .map_err(|source| ManifestError::Io {
                path: manifest.to_path_buf(),
                source,
            })?;
        manifest_package(&text).ok_or_else(|| ManifestError::MissingPackage {
            path: manifest.to_path_buf(),
        })
    }
}

/// Parses `<type> <name>` lines. Returns the first bad line number on error.
fn parse_public_list(text: &str) -> Result<HashSet<TypedName>, usize> {
    let mut public = HashSet::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let entry = match (parts.next(), parts.next(), parts.next()) {
            (Some(ty), Some(name), None) => ResourceType::from_name(ty).map(|ty| TypedName::new(ty, name)),
            _ => None,
        };
        public.insert(entry.ok_or(number + 1)?);
    }
    Ok(public)
}

/// Value of the `package` attribute of the `<manifest>` element.
fn manifest_package(text: &str) -> Option<String> {
    let start = text.find("<manifest")?;
    let element = &text[start..];
    let element = &element[..element.find('>')?];

    let mut rest = element;
    while let Some(at) = rest.find("package") {
        let preceded = rest[..at].ends_with(char::is_whitespace);
        let after = rest[at + "package".len()..].trim_start();
        if preceded && let Some(value) = after.strip_prefix('=') {
            let value = value.trim_start();
            let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            let body = &value[1..];
            let package = &body[..body.find(quote)?];
            return (!package.is_empty()).then(|| package.to_string());
        }
        rest = &rest[at + "package".len()..];
    }
    None
}
