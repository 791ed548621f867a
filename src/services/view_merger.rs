// ============================================================================
// VIEW MERGER - Snapshot + queue pendiente proyectados en la lista renderizada
// ============================================================================

use serde::Serialize;

use crate::models::{Item, ItemId, Mutation, PendingAction};

/// Una fila de la vista mezclada
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedItem {
    #[serde(flatten)]
    pub item: Item,
    /// Tiene cambios locales sin sincronizar
    pub pending: bool,
}

impl MergedItem {
    pub fn id(&self) -> &ItemId {
        &self.item.id
    }
}

/// Aplica `pending` en orden FIFO sobre una copia de `snapshot`.
///
/// Pura: las mismas entradas dan siempre la misma lista; se puede llamar
/// en cada render.
pub fn merge(snapshot: &[Item], pending: &[PendingAction]) -> Vec<MergedItem> {
    let mut view: Vec<MergedItem> = snapshot
        .iter()
        .cloned()
        .map(|item| MergedItem {
            item,
            pending: false,
        })
        .collect();

    for action in pending {
        match &action.mutation {
            Mutation::Create { data } => view.push(MergedItem {
                item: Item {
                    id: action.target.clone(),
                    data: data.clone(),
                    updated_at: Some(action.created_at),
                },
                pending: true,
            }),
            Mutation::Update { patch } => {
                // Si falta el target, un DELETE anterior ya lo quitó
                if let Some(entry) = view.iter_mut().find(|entry| entry.item.id == action.target) {
                    entry.item.data.apply(patch);
                    entry.item.updated_at = Some(action.created_at);
                    entry.pending = true;
                }
            }
            Mutation::Delete => view.retain(|entry| entry.item.id != action.target),
        }
    }

    view
}

/// Busca una entrada de la vista mezclada
pub fn find<'a>(view: &'a [MergedItem], id: &ItemId) -> Option<&'a MergedItem> {
    view.iter().find(|entry| entry.id() == id)
}
