//! Canvas state, persistence, and tile allocation.

/// First-available allocation and the shared canvas handle.
pub mod alloc;
/// Grid, claim index, and their pairing.
pub mod model;
/// Snapshot format and stores.
pub mod store;
