//! Resource layer configuration.

use strata_system::resource::GlobalResource;

use crate::ids::DEFAULT_DYNAMIC_ID_SEED;

/// Settings shared by every app repository of a [`ResourceContext`](crate::context::ResourceContext).
///
/// Registered as a read-only global by [`ResourcesPlugin`](crate::plugin::ResourcesPlugin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesConfig {
    /// Seed of every dynamic id allocator.
    pub dynamic_id_seed: i32,
    /// Suffix of packaged library folders.
    pub aar_suffix: String,
    /// Path component marking an extracted library (`<name>/<version>` below it).
    pub exploded_aar_marker: String,
    /// Symbol manifest next to a library's resource folder.
    pub symbol_file: String,
    /// Public resource list next to a library's resource folder.
    pub public_file: String,
    /// Manifest declaring the library's package.
    pub manifest_file: String,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            dynamic_id_seed: DEFAULT_DYNAMIC_ID_SEED,
            aar_suffix: ".aar".to_string(),
            exploded_aar_marker: "exploded-aar".to_string(),
            symbol_file: "R.txt".to_string(),
            public_file: "public.txt".to_string(),
            manifest_file: "AndroidManifest.xml".to_string(),
        }
    }
}

impl GlobalResource for ResourcesConfig {}

impl ResourcesConfig {
    /// Sets the dynamic id seed.
    #[must_use]
    pub fn with_dynamic_id_seed(mut self, seed: i32) -> Self {
        self.dynamic_id_seed = seed;
        self
    }

    /// Sets the symbol manifest file name.
    #[must_use]
    pub fn with_symbol_file(mut self, name: impl Into<String>) -> Self {
        self.symbol_file = name.into();
        self
    }

    /// Sets the public resource list file name.
    #[must_use]
    pub fn with_public_file(mut self, name: impl Into<String>) -> Self {
        self.public_file = name.into();
        self
    }

    /// Sets the manifest file name.
    #[must_use]
    pub fn with_manifest_file(mut self, name: impl Into<String>) -> Self {
        self.manifest_file = name.into();
        self
    }
}
