//! Offline-first replication engine for live martial-arts tournament
//! scoring.
//!
//! Keeps an on-device mirror of tournament data consistent with the cloud
//! document store, allows editing while offline and reconciles divergent
//! edits when connectivity returns. Scoreboard rendering, auth and form UI
//! live in the consuming application; this crate owns the consistency
//! logic.

pub mod database;
pub mod models;
pub mod services;

pub use database::local::{init_in_memory, init_mirror_db, MirrorDb};
pub use database::remote::common::CloudClient;
pub use services::cloud_sync::{CloudSync, SyncError};
pub use services::conflicts::detect_match_conflicts;
pub use services::replication::ReplicationManager;
pub use services::sync::{AutoUploader, SyncGate};
