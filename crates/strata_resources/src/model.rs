//! Resource types, items and the per-type tables repositories expose.

use core::fmt;
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// ResourceType
// ─────────────────────────────────────────────────────────────────────────────

/// Closed set of resource categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// `anim`
    Anim,
    /// `animator`
    Animator,
    /// `array`
    Array,
    /// `attr`
    Attr,
    /// `bool`
    Bool,
    /// `color`
    Color,
    /// `dimen`
    Dimen,
    /// `drawable`
    Drawable,
    /// `fraction`
    Fraction,
    /// `id`; may be declared any number of times with the same qualifiers.
    Id,
    /// `integer`
    Integer,
    /// `interpolator`
    Interpolator,
    /// `layout`
    Layout,
    /// `menu`
    Menu,
    /// `mipmap`
    Mipmap,
    /// `plurals`
    Plurals,
    /// `raw`
    Raw,
    /// `string`
    String,
    /// `style`
    Style,
    /// `styleable`; ids are `int[]` of attribute ids.
    Styleable,
    /// `transition`
    Transition,
    /// `xml`
    Xml,
}

impl ResourceType {
    /// Every type, in declaration order.
    pub const ALL: [Self; 22] = [
        Self::Anim,
        Self::Animator,
        Self::Array,
        Self::Attr,
        Self::Bool,
        Self::Color,
        Self::Dimen,
        Self::Drawable,
        Self::Fraction,
        Self::Id,
        Self::Integer,
        Self::Interpolator,
        Self::Layout,
        Self::Menu,
        Self::Mipmap,
        Self::Plurals,
        Self::Raw,
        Self::String,
        Self::Style,
        Self::Styleable,
        Self::Transition,
        Self::Xml,
    ];

    /// Returns the canonical lowercase name (`"color"`, `"styleable"`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Anim => "anim",
            Self::Animator => "animator",
            Self::Array => "array",
            Self::Attr => "attr",
            Self::Bool => "bool",
            Self::Color => "color",
            Self::Dimen => "dimen",
            Self::Drawable => "drawable",
            Self::Fraction => "fraction",
            Self::Id => "id",
            Self::Integer => "integer",
            Self::Interpolator => "interpolator",
            Self::Layout => "layout",
            Self::Menu => "menu",
            Self::Mipmap => "mipmap",
            Self::Plurals => "plurals",
            Self::Raw => "raw",
            Self::String => "string",
            Self::Style => "style",
            Self::Styleable => "styleable",
            Self::Transition => "transition",
            Self::Xml => "xml",
        }
    }

    /// Parses a canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceItem
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque payload of a resource declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResourceValue {
    /// No value (ids, file-based resources).
    #[default]
    Empty,
    /// A textual value such as `#FF0000` or `Hello`.
    Text(String),
    /// A declare-styleable block listing its attributes in declaration order.
    Styleable {
        /// Attribute names, `android:` prefixed for framework attributes.
        attrs: Vec<String>,
    },
}

/// A named, typed resource declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    ty: ResourceType,
    name: String,
    qualifiers: String,
    value: ResourceValue,
}

impl ResourceItem {
    /// Creates an unqualified item with an empty value.
    #[must_use]
    pub fn new(ty: ResourceType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            qualifiers: String::new(),
            value: ResourceValue::Empty,
        }
    }

    /// Creates an unqualified item with a textual value.
    #[must_use]
    pub fn text(ty: ResourceType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ty, name).with_value(ResourceValue::Text(value.into()))
    }

    /// Sets the qualifier string (`"en"`, `"land-hdpi"`, ...).
    #[must_use]
    pub fn with_qualifiers(mut self, qualifiers: impl Into<String>) -> Self {
        self.qualifiers = qualifiers.into();
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_value(mut self, value: ResourceValue) -> Self {
        self.value = value;
        self
    }

    /// The resource type.
    #[must_use]
    pub fn ty(&self) -> ResourceType {
        self.ty
    }

    /// The resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The qualifier string; empty for the default configuration.
    #[must_use]
    pub fn qualifiers(&self) -> &str {
        &self.qualifiers
    }

    /// The payload.
    #[must_use]
    pub fn value(&self) -> &ResourceValue {
        &self.value
    }

    /// Returns the textual value, if any.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match &self.value {
            ResourceValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The `(type, name)` key of this item.
    #[must_use]
    pub fn typed_name(&self) -> TypedName {
        TypedName::new(self.ty, self.name.clone())
    }
}

/// Key of the compiled and dynamic id tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedName {
    /// The resource type.
    pub ty: ResourceType,
    /// The resource name.
    pub name: String,
}

impl TypedName {
    /// Creates a key.
    #[must_use]
    pub fn new(ty: ResourceType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ty, self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

/// Items of one type, grouped by name.
///
/// Names keep first-insertion order so every consumer sees a stable
/// enumeration for the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    entries: IndexMap<String, Vec<Arc<ResourceItem>>>,
}

impl ResourceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item under its name.
    pub fn push(&mut self, item: Arc<ResourceItem>) {
        self.entries
            .entry(item.name().to_string())
            .or_default()
            .push(item);
    }

    /// Returns all items declared under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> &[Arc<ResourceItem>] {
        match self.entries.get(name) {
            Some(items) => items,
            None => &[],
        }
    }

    /// Returns true if at least one item is declared under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes every item declared under `name`.
    pub fn remove(&mut self, name: &str) -> Vec<Arc<ResourceItem>> {
        self.entries.shift_remove(name).unwrap_or_default()
    }

    /// Iterates over `(name, items)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<ResourceItem>])> {
        self.entries
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// Iterates over the distinct names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of items across all names.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if the table holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Items of every type a repository declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    tables: HashMap<ResourceType, Arc<ResourceTable>>,
}

impl ResourceMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a list of items.
    pub fn from_items(items: impl IntoIterator<Item = ResourceItem>) -> Self {
        let mut map = Self::new();
        for item in items {
            map.insert(item);
        }
        map
    }

    /// Adds an item to the table of its type.
    pub fn insert(&mut self, item: ResourceItem) {
        Arc::make_mut(self.tables.entry(item.ty()).or_default()).push(Arc::new(item));
    }

    /// Replaces the whole table of one type. An empty table removes the type.
    pub fn set_table(&mut self, ty: ResourceType, table: ResourceTable) {
        if table.is_empty() {
            self.tables.remove(&ty);
        } else {
            self.tables.insert(ty, Arc::new(table));
        }
    }

    pub(crate) fn set_shared_table(&mut self, ty: ResourceType, table: Arc<ResourceTable>) {
        if table.is_empty() {
            self.tables.remove(&ty);
        } else {
            self.tables.insert(ty, table);
        }
    }

    /// Removes all items named `name` of type `ty`, returning them.
    pub fn remove(&mut self, ty: ResourceType, name: &str) -> Vec<Arc<ResourceItem>> {
        let Some(table) = self.tables.get_mut(&ty) else {
            return Vec::new();
        };
        let removed = Arc::make_mut(table).remove(name);
        if table.is_empty() {
            self.tables.remove(&ty);
        }
        removed
    }

    /// Returns the table of one type.
    #[must_use]
    pub fn get(&self, ty: ResourceType) -> Option<&Arc<ResourceTable>> {
        self.tables.get(&ty)
    }

    /// Types with at least one item, in [`ResourceType::ALL`] order.
    #[must_use]
    pub fn types(&self) -> Vec<ResourceType> {
        ResourceType::ALL
            .into_iter()
            .filter(|ty| self.tables.contains_key(ty))
            .collect()
    }

    /// Returns true if no type has items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
