//! PersistenceGateway trait - classified record storage
//!
//! Defines the abstract "store one classified record" capability.

use crate::ClassifiedRecord;

/// Record storage trait
///
/// All hub implementations must implement this trait.
#[trait_variant::make(PersistenceGateway: Send)]
pub trait LocalPersistenceGateway {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one record
    ///
    /// Returns `false` on storage-layer failure instead of erroring, so the
    /// caller decides whether the loss is recoverable. A record without `id`
    /// creates a new row; a record with `id` replaces the row with that id.
    async fn save(&mut self, record: &ClassifiedRecord) -> bool;

    /// Release storage resources
    async fn close(&mut self);
}
