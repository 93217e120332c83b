//! Storage port — the repository holding each door's persisted record.

use std::future::Future;
use std::sync::Arc;

use doorwatch_domain::door::DoorName;
use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::record::DoorRecord;

/// Durable key-value store of [`DoorRecord`]s keyed by door name.
///
/// `load` and `save` are the only access points. A `save` that returns `Ok`
/// must be durable before the next `load`.
pub trait DoorRepository: Send + Sync {
    /// Load the record for `door`, or `None` if it was never saved.
    fn load(
        &self,
        door: &DoorName,
    ) -> impl Future<Output = Result<Option<DoorRecord>, DoorwatchError>> + Send;

    /// Replace the record for `door`.
    fn save(
        &self,
        door: &DoorName,
        record: &DoorRecord,
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send;
}

impl<T: DoorRepository> DoorRepository for Arc<T> {
    fn load(
        &self,
        door: &DoorName,
    ) -> impl Future<Output = Result<Option<DoorRecord>, DoorwatchError>> + Send {
        (**self).load(door)
    }

    fn save(
        &self,
        door: &DoorName,
        record: &DoorRecord,
    ) -> impl Future<Output = Result<(), DoorwatchError>> + Send {
        (**self).save(door, record)
    }
}
