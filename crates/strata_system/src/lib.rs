//! Plugin runtime for Strata (Layer 1).
//!
//! `strata_system` hosts the process-wide state that the resource layers
//! share. Nothing in it knows about resources; it only provides the pieces
//! that let higher layers be assembled and torn down explicitly:
//!
//! - [`plugin`] - Plugin trait, plugin groups and tick schedules
//! - [`resource`] - Type-keyed storage for process-wide state
//! - [`server`] - Server runtime that orchestrates the plugin lifecycle
//!
//! # Architecture
//!
//! - **Layer 1** (`strata_system`): plugin runtime and resource container (this crate)
//! - **Layer 2** (`strata_resources`): repositories, id tables, class registry
//! - **Layer 3** (hosts): build-model and parsing integrations that tick the server
//!
//! # Example
//!
//! ```
//! use strata_system::plugin::Plugin;
//! use strata_system::server::Server;
//! use strata_system::resource::GlobalResource;
//!
//! #[derive(Default)]
//! struct ScanSettings { max_depth: usize }
//! impl GlobalResource for ScanSettings {}
//!
//! struct ScanPlugin;
//!
//! impl Plugin for ScanPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(ScanSettings::default());
//!     }
//! }
//!
//! Server::new()
//!     .add_plugins(ScanPlugin)
//!     .finish();
//! ```

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Resource container management.
pub mod resource;

/// Server runtime for plugin orchestration.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
