//! Layered resource repositories with merge caches, synthetic resource ids
//! and on-demand accessor classes.
//!

pub use strata_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use strata_internal::prelude::*;
}
