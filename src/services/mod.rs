pub mod cloud_sync;
pub mod conflicts;
pub mod replication;
pub mod sync;
