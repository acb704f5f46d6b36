//! Sync orchestration guard.
//!
//! `SyncGate` is a pure function of explicitly passed state; the engine
//! never reads ambient globals. Realtime subscriptions and the auto-upload
//! trigger are only allowed while the gate holds: the device is online, no
//! form edit is in flight, a user identity is present and a tournament is
//! selected.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cloud_sync::CloudSync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncGate {
    pub online: bool,
    /// Pauses inbound overwrites while the user is mid-form-edit.
    pub is_editing: bool,
    pub has_user: bool,
    pub has_tournament: bool,
}

impl SyncGate {
    pub fn should_sync(&self) -> bool {
        self.online && !self.is_editing && self.has_user && self.has_tournament
    }
}

/// Pushes pending records whenever the observed unsynced count transitions
/// to non-zero while the gate holds. Failures are logged, never surfaced;
/// the records stay unsynced and the next transition retries them.
pub struct AutoUploader {
    task: JoinHandle<()>,
}

impl AutoUploader {
    pub fn spawn(
        sync: Arc<CloudSync>,
        organization_id: &str,
        tournament_id: &str,
        mut gate_rx: watch::Receiver<SyncGate>,
        mut count_rx: watch::Receiver<i64>,
    ) -> Self {
        let org = organization_id.to_string();
        let tid = tournament_id.to_string();

        let task = tokio::spawn(async move {
            let mut last_count = *count_rx.borrow();
            loop {
                tokio::select! {
                    changed = count_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let count = *count_rx.borrow_and_update();
                        let gate = *gate_rx.borrow();
                        if count > 0 && last_count == 0 && gate.should_sync() {
                            match sync.upload_results(&org, &tid, gate.online).await {
                                Ok(n) => {
                                    log::info!("[sync] auto upload pushed {} records", n)
                                }
                                Err(e) => log::warn!("[sync] auto upload failed: {}", e),
                            }
                        }
                        last_count = count;
                    }
                    changed = gate_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { task }
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}
