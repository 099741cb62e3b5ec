//! Resource storage.
//!
//! - [`Resources`] - Type-keyed storage handing out shared references
//! - [`GlobalResource`] - Marker for read-only, server-lifetime resources
//!
//! Global resources are registered via
//! [`Server::insert_global()`](crate::server::Server::insert_global) and are
//! how process-wide context objects (for example the resource context that
//! owns every repository graph) are made reachable without hidden statics.

#[expect(
    clippy::module_inception,
    reason = "resource.rs contains the core Resource trait and Resources container logic"
)]
mod resource;

pub use resource::{GlobalResource, Resource, ResourceError, ResourceId, Resources};
