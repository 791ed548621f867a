use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::item::{ItemData, ItemId, ItemPatch};

// ============================================================================
// PENDING ACTION - Una mutación aún no confirmada
// ============================================================================

/// Id de acción generado localmente: `act_<millis>_<random>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        ActionId(format!("act_{}_{}", now.timestamp_millis(), random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identificador local nuevo para un item creado offline
pub fn generate_local_id(now: DateTime<Utc>) -> ItemId {
    ItemId::Local(format!("local_{}_{}", now.timestamp_millis(), random_suffix()))
}

fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    suffix
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Create => "CREATE",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
        })
    }
}

/// Qué hace la acción sobre su target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutation {
    Create { data: ItemData },
    Update { patch: ItemPatch },
    Delete,
}

impl Mutation {
    pub fn kind(&self) -> ActionKind {
        match self {
            Mutation::Create { .. } => ActionKind::Create,
            Mutation::Update { .. } => ActionKind::Update,
            Mutation::Delete => ActionKind::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: ActionId,
    /// Id de servidor si se conoce, id local si no
    pub target: ItemId,
    #[serde(flatten)]
    pub mutation: Mutation,
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(target: ItemId, mutation: Mutation, now: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::generate(now),
            target,
            mutation,
            created_at: now,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.mutation.kind()
    }
}
