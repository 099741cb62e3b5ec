//! Compiled and dynamic resource ids.
//!
//! Compiled ids come from a build and are replaced as one unit. Resources
//! without a compiled id get a synthetic one from [`DynamicIds`], allocated
//! upwards from a seed that lies outside the compiled id space.

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::model::{ResourceType, TypedName};
use crate::symbols::SymbolTable;

/// Default seed for synthetic ids. The first id handed out is `seed + 1`.
pub const DEFAULT_DYNAMIC_ID_SEED: i32 = 0x7fff_0000;

/// Synthetic ids must stay within the 16-bit block of their seed.
const BLOCK_MASK: i32 = !0xffff;

// ─────────────────────────────────────────────────────────────────────────────
// CompiledIds
// ─────────────────────────────────────────────────────────────────────────────

/// Ids assigned by a build: `id → (type, name)`, `(type, name) → id` and
/// `int[] → styleable name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledIds {
    by_name: HashMap<ResourceType, HashMap<String, i32>>,
    by_id: HashMap<i32, TypedName>,
    styleables: HashMap<Vec<i32>, String>,
}

impl CompiledIds {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a table.
    #[must_use]
    pub fn builder() -> CompiledIdsBuilder {
        CompiledIdsBuilder {
            ids: Self::default(),
        }
    }

    /// Builds a table from a symbol manifest.
    #[must_use]
    pub fn from_symbols(symbols: &SymbolTable) -> Self {
        let mut builder = Self::builder();
        for (ty, name, value) in symbols.ids() {
            builder = builder.id(ty, name, value);
        }
        for (name, values) in symbols.styleables() {
            builder = builder.styleable(name, values.to_vec());
        }
        builder.build()
    }

    /// Compiled id of `(ty, name)`.
    #[must_use]
    pub fn id(&self, ty: ResourceType, name: &str) -> Option<i32> {
        self.by_name.get(&ty).and_then(|names| names.get(name)).copied()
    }

    /// Resource that owns `id`.
    #[must_use]
    pub fn resolve(&self, id: i32) -> Option<&TypedName> {
        self.by_id.get(&id)
    }

    /// Styleable whose attribute ids are exactly `ids`.
    #[must_use]
    pub fn styleable(&self, ids: &[i32]) -> Option<&str> {
        self.styleables.get(ids).map(String::as_str)
    }

    /// Number of scalar ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the table holds no ids and no styleables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.styleables.is_empty()
    }
}

/// Builder for [`CompiledIds`].
#[derive(Debug)]
pub struct CompiledIdsBuilder {
    ids: CompiledIds,
}

impl CompiledIdsBuilder {
    /// Adds a scalar id. A later entry for the same key replaces the earlier one.
    #[must_use]
    pub fn id(mut self, ty: ResourceType, name: impl Into<String>, value: i32) -> Self {
        let name = name.into();
        self.ids
            .by_name
            .entry(ty)
            .or_default()
            .insert(name.clone(), value);
        self.ids.by_id.insert(value, TypedName::new(ty, name));
        self
    }

    /// Adds a styleable array.
    #[must_use]
    pub fn styleable(mut self, name: impl Into<String>, values: Vec<i32>) -> Self {
        self.ids.styleables.insert(values, name.into());
        self
    }

    /// Finishes the table.
    #[must_use]
    pub fn build(self) -> CompiledIds {
        self.ids
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DynamicIds
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct DynamicState {
    last: i32,
    by_name: HashMap<ResourceType, HashMap<String, i32>>,
    by_id: HashMap<i32, TypedName>,
}

impl DynamicState {
    fn new(seed: i32) -> Self {
        Self {
            last: seed,
            by_name: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    fn get(&self, ty: ResourceType, name: &str) -> Option<i32> {
        self.by_name.get(&ty).and_then(|names| names.get(name)).copied()
    }
}

/// Thread-safe allocator of synthetic ids.
///
/// Lookups of existing ids take a shared lock; allocation takes the
/// exclusive lock and re-checks, so two racing requests for the same name
/// receive the same id and no id is ever given to two names.
///
/// ```
/// use strata_resources::ids::DynamicIds;
/// use strata_resources::model::ResourceType;
///
/// let ids = DynamicIds::with_seed(0x7f00_0000);
/// let first = ids.get_or_allocate(ResourceType::String, "app_name");
/// assert_eq!(first, 0x7f00_0001);
/// assert_eq!(ids.get_or_allocate(ResourceType::String, "app_name"), first);
/// assert_eq!(ids.resolve(first).unwrap().name, "app_name");
/// ```
#[derive(Debug)]
pub struct DynamicIds {
    seed: i32,
    state: RwLock<DynamicState>,
}

impl Default for DynamicIds {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicIds {
    /// Creates an allocator seeded with [`DEFAULT_DYNAMIC_ID_SEED`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_DYNAMIC_ID_SEED)
    }

    /// Creates an allocator with a custom seed.
    #[must_use]
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            state: RwLock::new(DynamicState::new(seed)),
        }
    }

    /// The seed ids are allocated above.
    #[must_use]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Existing synthetic id of `(ty, name)`, without allocating.
    #[must_use]
    pub fn get(&self, ty: ResourceType, name: &str) -> Option<i32> {
        self.state.read().get(ty, name)
    }

    /// Returns the synthetic id of `(ty, name)`, allocating the next one on a miss.
    ///
    /// Callers consult compiled ids first.
    ///
    /// # Panics
    ///
    /// If the allocation would leave the seed's 16-bit block. That many
    /// synthetic ids means the seed overlaps real resources.
    pub fn get_or_allocate(&self, ty: ResourceType, name: &str) -> i32 {
        if let Some(id) = self.get(ty, name) {
            return id;
        }

        let mut state = self.state.write();
        if let Some(id) = state.get(ty, name) {
            return id;
        }

        let id = state
            .last
            .checked_add(1)
            .filter(|id| id & BLOCK_MASK == self.seed & BLOCK_MASK);
        let Some(id) = id else {
            panic!(
                "dynamic resource id space exhausted above seed {:#010x}",
                self.seed
            );
        };

        state.last = id;
        state
            .by_name
            .entry(ty)
            .or_default()
            .insert(name.to_string(), id);
        state.by_id.insert(id, TypedName::new(ty, name));
        id
    }

    /// Resource that owns a synthetic id.
    #[must_use]
    pub fn resolve(&self, id: i32) -> Option<TypedName> {
        self.state.read().by_id.get(&id).cloned()
    }

    /// Forgets every allocation; the next id is `seed + 1` again.
    pub fn reset(&self) {
        *self.state.write() = DynamicState::new(self.seed);
    }

    /// Number of live allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().by_id.len()
    }

    /// Returns true if nothing is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_ids_resolve_both_ways() {
        let ids = CompiledIds::builder()
            .id(ResourceType::Color, "primary", 0x7f01_0000)
            .styleable("View", vec![0x0101_0000, 0x0101_0001])
            .build();

        assert_eq!(ids.id(ResourceType::Color, "primary"), Some(0x7f01_0000));
        assert_eq!(ids.id(ResourceType::String, "primary"), None);
        assert_eq!(
            ids.resolve(0x7f01_0000),
            Some(&TypedName::new(ResourceType::Color, "primary"))
        );
        assert_eq!(ids.styleable(&[0x0101_0000, 0x0101_0001]), Some("View"));
        assert_eq!(ids.styleable(&[0x0101_0001]), None);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn first_allocation_is_seed_plus_one() {
        let ids = DynamicIds::new();
        assert_eq!(
            ids.get_or_allocate(ResourceType::Id, "a"),
            DEFAULT_DYNAMIC_ID_SEED + 1
        );
        assert_eq!(
            ids.get_or_allocate(ResourceType::Id, "b"),
            DEFAULT_DYNAMIC_ID_SEED + 2
        );
    }

    #[test]
    fn same_name_different_type_gets_distinct_ids() {
        let ids = DynamicIds::new();
        let a = ids.get_or_allocate(ResourceType::Color, "accent");
        let b = ids.get_or_allocate(ResourceType::Attr, "accent");
        assert_ne!(a, b);
        assert_eq!(ids.get(ResourceType::Color, "accent"), Some(a));
    }

    #[test]
    fn reset_forgets_and_restarts() {
        let ids = DynamicIds::with_seed(0x7e00_0000);
        let first = ids.get_or_allocate(ResourceType::Layout, "main");
        ids.get_or_allocate(ResourceType::Layout, "other");
        ids.reset();

        assert!(ids.is_empty());
        assert!(ids.resolve(first).is_none());
        assert_eq!(ids.get_or_allocate(ResourceType::Layout, "fresh"), first);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn leaving_the_block_panics() {
        let ids = DynamicIds::with_seed(0x0100_fffe);
        assert_eq!(ids.get_or_allocate(ResourceType::Id, "last"), 0x0100_ffff);
        ids.get_or_allocate(ResourceType::Id, "overflow");
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn overflowing_i32_panics() {
        let ids = DynamicIds::with_seed(i32::MAX);
        ids.get_or_allocate(ResourceType::Id, "overflow");
    }
}
