//! The [`Resource`] trait and the [`Resources`] container.

use core::any::{Any, TypeId};
use hashbrown::HashMap;

/// A value that can be stored in a [`Resources`] container.
///
/// Any type that is `Send + Sync + 'static` is a resource.
pub trait Resource: Send + Sync + 'static {
    /// Returns the type name for debugging purposes.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker trait for global, read-only resources.
///
/// Global resources live as long as the server and are only handed out
/// through shared references. Types that need to change after the build
/// phase use interior mutability, which keeps their locking policy next to
/// the data it protects.
///
/// ```
/// use strata_system::resource::GlobalResource;
/// use strata_system::server::Server;
///
/// struct Limits { max_children: usize }
/// impl GlobalResource for Limits {}
///
/// let mut server = Server::new();
/// server.insert_global(Limits { max_children: 64 });
/// assert_eq!(server.get_global::<Limits>().unwrap().max_children, 64);
/// ```
pub trait GlobalResource: Resource {}

/// Unique identifier for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(TypeId);

impl ResourceId {
    /// Creates a `ResourceId` for the given type.
    #[must_use]
    pub fn of<T: Resource>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0
    }
}

/// Errors that can occur during resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The requested resource type was not found in the container.
    #[error("resource not found: {0}")]
    NotFound(&'static str),
}

type BoxedValue = Box<dyn Any + Send + Sync>;

/// Container for storing resources keyed by type.
///
/// Values are only handed out by shared reference; mutation after insertion
/// goes through the value's own interior mutability.
///
/// ```
/// use strata_system::resource::Resources;
///
/// struct Seed(u32);
///
/// let mut resources = Resources::new();
/// resources.insert(Seed(7));
/// assert_eq!(resources.get::<Seed>().unwrap().0, 7);
/// ```
#[derive(Default)]
pub struct Resources {
    storage: HashMap<ResourceId, BoxedValue>,
}

impl Resources {
    /// Creates a new empty resource container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts a resource, returning the value it replaced.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        self.storage
            .insert(ResourceId::of::<T>(), Box::new(resource))
            .and_then(|old| old.downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Returns `true` if a resource of type `T` exists.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.storage.contains_key(&ResourceId::of::<T>())
    }

    /// Gets a shared reference to a resource.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if the resource type is not registered.
    pub fn get<T: Resource>(&self) -> Result<&T, ResourceError> {
        self.storage
            .get(&ResourceId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }

    /// Removes a resource from the container and returns it.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.storage
            .remove(&ResourceId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Removes all resources from the container.
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Returns the number of resources stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if no resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
