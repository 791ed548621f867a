use serde::{Deserialize, Serialize};

use crate::models::item::{Item, ItemId};
use crate::models::pending_action::ActionId;

/// Estado del banner de sincronización que muestra la UI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncState {
    Synced,
    Pending { count: usize },
    Syncing,
    Offline {
        last_error: Option<String>,
        pending_count: usize,
    },
    Error { message: String },
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Synced
    }
}

/// Por qué se rechazó una intención antes de llegar a la queue
#[derive(Clone, Debug, PartialEq)]
pub enum RejectReason {
    UnknownTarget(ItemId),
    Invalid(String),
}

/// Resultado de despachar un create/update/delete
#[derive(Clone, Debug, PartialEq)]
pub enum MutationResult {
    /// Confirmado por el servidor; `None` en los deletes
    Applied(Option<Item>),
    /// Diferido; lo reproducirá el sync engine
    Queued(ActionId),
    /// Un item nunca sincronizado se borró localmente junto con sus acciones en queue
    Discarded { local_id: ItemId, dropped: usize },
    /// Rechazado localmente, no se escribió nada
    Rejected(RejectReason),
}

impl MutationResult {
    pub fn is_queued(&self) -> bool {
        matches!(self, MutationResult::Queued(_))
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MutationResult::Applied(_))
    }
}

/// Conteos de una pasada de sincronización
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub snapshot_refreshed: bool,
}

impl SyncReport {
    /// El progreso parcial se conserva igual; una acción fallida falla la pasada
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SyncOutcome {
    /// Ya había otra sincronización en curso
    Skipped,
    Completed(SyncReport),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Skipped => None,
            SyncOutcome::Completed(report) => Some(report),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncProgress {
    pub processed: usize,
    pub total: usize,
}

impl SyncProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }

    pub fn is_running(&self) -> bool {
        self.processed < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_rounds_down() {
        let progress = SyncProgress {
            processed: 1,
            total: 3,
        };
        assert_eq!(progress.percent(), 33);
        assert!(progress.is_running());
        assert_eq!(SyncProgress::default().percent(), 100);
    }

    #[test]
    fn report_fails_when_any_action_failed() {
        let report = SyncReport {
            synced: 2,
            failed: 1,
            ..SyncReport::default()
        };
        assert!(!report.is_success());
        assert!(SyncReport::default().is_success());
    }
}
