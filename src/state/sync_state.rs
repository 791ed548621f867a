// ============================================================================
// SYNC STATE - Banner y progreso que observa la UI
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::models::{SyncProgress, SyncReport, SyncState};
use crate::state::reactivity::ReactiveState;

#[derive(Clone)]
pub struct SyncStateWrapper {
    pub sync_state: ReactiveState<SyncState>,
    pub progress: ReactiveState<SyncProgress>,
    pub last_sync_attempt: Rc<RefCell<Option<DateTime<Utc>>>>,
    pub last_report: Rc<RefCell<Option<SyncReport>>>,
}

impl SyncStateWrapper {
    pub fn new() -> Self {
        Self {
            sync_state: ReactiveState::new(SyncState::Synced),
            progress: ReactiveState::new(SyncProgress::default()),
            last_sync_attempt: Rc::new(RefCell::new(None)),
            last_report: Rc::new(RefCell::new(None)),
        }
    }

    pub fn get_sync_state(&self) -> SyncState {
        self.sync_state.get()
    }

    pub fn set_sync_state(&self, state: SyncState) {
        self.sync_state.replace_if_changed(state);
    }

    pub fn get_progress(&self) -> SyncProgress {
        self.progress.get()
    }

    pub fn set_progress(&self, progress: SyncProgress) {
        self.progress.set(progress);
    }

    pub fn begin_sync(&self, total: usize, at: DateTime<Utc>) {
        *self.last_sync_attempt.borrow_mut() = Some(at);
        self.set_progress(SyncProgress {
            processed: 0,
            total,
        });
        self.set_sync_state(SyncState::Syncing);
    }

    /// Publica el banner de una pasada terminada
    pub fn finish_sync(&self, report: &SyncReport, remaining: usize) {
        let state = if report.failed > 0 {
            SyncState::Error {
                message: format!(
                    "{} of {} changes failed to sync",
                    report.failed,
                    report.failed + report.synced
                ),
            }
        } else if remaining > 0 {
            SyncState::Pending { count: remaining }
        } else {
            SyncState::Synced
        };
        *self.last_report.borrow_mut() = Some(report.clone());
        self.set_sync_state(state);
    }

    /// Una pasada abortada antes de terminar
    pub fn fail_sync(&self, message: String) {
        self.set_progress(SyncProgress::default());
        self.set_sync_state(SyncState::Error { message });
    }

    /// Refleja el tamaño de la queue fuera de una pasada
    pub fn refresh_pending(&self, pending_count: usize, online: bool) {
        let current = self.get_sync_state();
        if matches!(current, SyncState::Syncing) {
            return;
        }
        let next = if !online {
            let last_error = match current {
                SyncState::Error { message } => Some(message),
                SyncState::Offline { last_error, .. } => last_error,
                _ => None,
            };
            SyncState::Offline {
                last_error,
                pending_count,
            }
        } else if pending_count > 0 {
            // El banner de error sigue visible hasta la próxima pasada
            if matches!(current, SyncState::Error { .. }) {
                return;
            }
            SyncState::Pending {
                count: pending_count,
            }
        } else {
            SyncState::Synced
        };
        self.set_sync_state(next);
    }

    pub fn get_last_sync_attempt(&self) -> Option<DateTime<Utc>> {
        *self.last_sync_attempt.borrow()
    }

    pub fn get_last_report(&self) -> Option<SyncReport> {
        self.last_report.borrow().clone()
    }
}

impl Default for SyncStateWrapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_pass_raises_error_banner() {
        let state = SyncStateWrapper::new();
        let report = SyncReport {
            synced: 2,
            failed: 1,
            ..SyncReport::default()
        };
        state.finish_sync(&report, 1);
        assert_eq!(
            state.get_sync_state(),
            SyncState::Error {
                message: "1 of 3 changes failed to sync".into()
            }
        );
    }

    #[test]
    fn aborted_pass_leaves_syncing_state() {
        let state = SyncStateWrapper::new();
        state.begin_sync(3, Utc::now());
        state.fail_sync("storage backend unavailable".into());

        assert!(!state.get_progress().is_running());
        state.refresh_pending(3, true);
        assert_eq!(
            state.get_sync_state(),
            SyncState::Error {
                message: "storage backend unavailable".into()
            }
        );
    }

    #[test]
    fn going_offline_keeps_last_error() {
        let state = SyncStateWrapper::new();
        state.set_sync_state(SyncState::Error {
            message: "boom".into(),
        });
        state.refresh_pending(2, false);
        assert_eq!(
            state.get_sync_state(),
            SyncState::Offline {
                last_error: Some("boom".into()),
                pending_count: 2
            }
        );
    }

    #[test]
    fn empty_queue_online_is_synced() {
        let state = SyncStateWrapper::new();
        state.refresh_pending(3, true);
        assert_eq!(state.get_sync_state(), SyncState::Pending { count: 3 });
        state.refresh_pending(0, true);
        assert_eq!(state.get_sync_state(), SyncState::Synced);
    }
}
