//! Library resource visibility.

use hashbrown::HashSet;
use std::sync::Arc;

use crate::library::LibraryRepository;
use crate::model::{ResourceType, TypedName};

/// Answers whether a resource is private to the library declaring it.
///
/// A library that publishes a public list makes every other resource in its
/// symbol manifest private. A resource stays visible when any library lists
/// it as public, so re-exported names are not hidden by a stricter library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityTable {
    variant: String,
    private: Option<HashSet<TypedName>>,
}

impl VisibilityTable {
    /// A table under which nothing is private.
    pub const NONE: Self = Self {
        variant: String::new(),
        private: None,
    };

    /// Builds the table for `variant` from the libraries currently composed.
    #[must_use]
    pub fn build(variant: impl Into<String>, libraries: &[Arc<LibraryRepository>]) -> Self {
        let mut public = HashSet::new();
        let mut declared = HashSet::new();
        for library in libraries {
            let (Some(symbols), Some(listed)) = (library.symbols(), library.public_resources()) else {
                continue;
            };
            public.extend(listed.iter().cloned());
            declared.extend(symbols.ids().map(|(ty, name, _)| TypedName::new(ty, name)));
        }

        let private: HashSet<TypedName> = declared
            .into_iter()
            .filter(|name| !public.contains(name))
            .collect();
        Self {
            variant: variant.into(),
            private: Some(private),
        }
    }

    /// Build variant the table was computed for.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Returns true if `(ty, name)` is private to its library.
    #[must_use]
    pub fn is_private(&self, ty: ResourceType, name: &str) -> bool {
        self.private
            .as_ref()
            .is_some_and(|private| private.contains(&TypedName::new(ty, name)))
    }

    /// Number of private resources.
    #[must_use]
    pub fn private_count(&self) -> usize {
        self.private.as_ref().map_or(0, HashSet::len)
    }
}
