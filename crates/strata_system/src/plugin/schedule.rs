//! Schedule identifiers for tick-based plugin updates.
//!
//! Hosts report external events to the server by ticking a schedule. A
//! schedule is any `'static` marker type wrapped in a [`ScheduleId`].

use core::any::TypeId;
use variadics_please::all_tuples;

/// Identifier for a tick schedule, derived from a marker type.
///
/// # Example
///
/// ```
/// # use strata_system::plugin::{Plugin, ScheduleId};
/// # use strata_system::server::Server;
/// pub struct BuildFinished;
///
/// # struct RootsPlugin;
/// impl Plugin for RootsPlugin {
///     fn build(&self, _server: &mut Server) {}
///
///     fn tick_schedules(&self) -> Vec<ScheduleId> {
///         vec![ScheduleId::of::<BuildFinished>()]
///     }
///
///     fn update(&self, _server: &mut Server, _schedule: ScheduleId) {
///         // called when the host runs server.tick::<BuildFinished>()
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// Creates a `ScheduleId` for the given schedule marker type.
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Marker trait for schedule types.
///
/// [`ScheduleId::of`] accepts any `'static` type; implementing `Schedule`
/// lets a marker take part in [`IntoScheduleIds`] tuples.
pub trait Schedule: 'static {}

/// Types that can be converted into a list of schedule IDs.
///
/// Implemented for single schedules and tuples of schedules, so a plugin can
/// subscribe to several host events at once:
///
/// ```
/// # use strata_system::plugin::{IntoScheduleIds, Schedule};
/// struct SyncSucceeded;
/// impl Schedule for SyncSucceeded {}
/// struct BuildFinished;
/// impl Schedule for BuildFinished {}
///
/// assert_eq!(<(SyncSucceeded, BuildFinished)>::schedule_ids().len(), 2);
/// ```
pub trait IntoScheduleIds {
    /// Returns the schedule IDs for this type.
    fn schedule_ids() -> Vec<ScheduleId>;
}

impl<S: Schedule> IntoScheduleIds for S {
    fn schedule_ids() -> Vec<ScheduleId> {
        vec![ScheduleId::of::<S>()]
    }
}

macro_rules! impl_into_schedule_ids_for_tuple {
    ($($S:ident),*) => {
        impl<$($S: Schedule),*> IntoScheduleIds for ($($S,)*) {
            fn schedule_ids() -> Vec<ScheduleId> {
                vec![$(ScheduleId::of::<$S>()),*]
            }
        }
    };
}

all_tuples!(impl_into_schedule_ids_for_tuple, 2, 8, S);
