//! Core infrastructure plugins for Strata.
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//!
//! # Example
//!
//! ```
//! use strata_system::server::Server;
//! use strata_core_plugins::TracingPlugin;
//! use tracing::Level;
//!
//! Server::new()
//!     .add_plugins(TracingPlugin::default().with_level(Level::DEBUG))
//!     .finish();
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`strata_system`, `strata_core_plugins`): runtime and infrastructure
//! - **Layer 2** (`strata_classfile`, `strata_resources`): repositories and class generation
//! - **Layer 3** (hosts): IDE integrations that tick build events

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};
