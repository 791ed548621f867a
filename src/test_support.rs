//! Colaboradores en memoria compartidos por los tests unitarios.

use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::error::ApiError;
use crate::models::{Item, ItemData, ItemPatch};
use crate::services::api_client::{ConnectivityProbe, ItemApi};

/// Backend falso con items del servidor que registra cada llamada
#[derive(Default)]
pub(crate) struct FakeApi {
    server: RefCell<Vec<Item>>,
    next_id: Cell<i64>,
    calls: RefCell<Vec<String>>,
    unreachable: Cell<bool>,
    stalled: Cell<bool>,
    failing_ids: RefCell<HashSet<i64>>,
    failing_names: RefCell<HashSet<String>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn with_items(items: Vec<Item>) -> Self {
        let next_id = items
            .iter()
            .filter_map(|item| item.id.server_id())
            .max()
            .unwrap_or(0)
            + 1;
        let api = Self::default();
        *api.server.borrow_mut() = items;
        api.next_id.set(next_id.max(100));
        api
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Llamadas que no son `list`
    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call != "list")
            .collect()
    }

    pub fn server_items(&self) -> Vec<Item> {
        self.server.borrow().clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.set(unreachable);
    }

    /// Las mutaciones nunca terminan; solo un timeout las corta
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.set(stalled);
    }

    pub fn fail_id(&self, id: i64) {
        self.failing_ids.borrow_mut().insert(id);
    }

    pub fn fail_name(&self, name: &str) {
        self.failing_names.borrow_mut().insert(name.to_string());
    }

    /// La próxima mutación espera hasta que dispare el sender devuelto
    pub fn hold_next_mutation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    async fn enter(&self, call: String) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call);
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.stalled.get() {
            futures::future::pending::<()>().await;
        }
        if self.unreachable.get() {
            return Err(ApiError::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ItemApi for FakeApi {
    async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
        self.calls.borrow_mut().push("list".into());
        if self.unreachable.get() {
            return Err(ApiError::Network("connection refused".into()));
        }
        Ok(self.server_items())
    }

    async fn create_item(&self, data: &ItemData) -> Result<Item, ApiError> {
        self.enter(format!("create {}", data.name)).await?;
        if self.failing_names.borrow().contains(&data.name) {
            return Err(ApiError::Http {
                status: 422,
                message: format!("invalid item {}", data.name),
            });
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let item = Item::new(id, data.clone());
        self.server.borrow_mut().push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: i64, patch: &ItemPatch) -> Result<Item, ApiError> {
        self.enter(format!("update {}", id)).await?;
        if self.failing_ids.borrow().contains(&id) {
            return Err(ApiError::Http {
                status: 500,
                message: "update failed".into(),
            });
        }
        let mut server = self.server.borrow_mut();
        let item = server
            .iter_mut()
            .find(|item| item.id.server_id() == Some(id))
            .ok_or(ApiError::Http {
                status: 404,
                message: format!("item {} not found", id),
            })?;
        item.data.apply(patch);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: i64) -> Result<(), ApiError> {
        self.enter(format!("delete {}", id)).await?;
        if self.failing_ids.borrow().contains(&id) {
            return Err(ApiError::Rejected("delete refused".into()));
        }
        self.server
            .borrow_mut()
            .retain(|item| item.id.server_id() != Some(id));
        Ok(())
    }
}

/// Probe cuya respuesta fija el test
#[derive(Default)]
pub(crate) struct FakeProbe {
    reachable: Cell<bool>,
    probes: Cell<usize>,
}

impl FakeProbe {
    pub fn new(reachable: bool) -> Self {
        let probe = Self::default();
        probe.reachable.set(reachable);
        probe
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.set(reachable);
    }

    pub fn probes(&self) -> usize {
        self.probes.get()
    }
}

#[async_trait(?Send)]
impl ConnectivityProbe for FakeProbe {
    async fn probe(&self) -> Result<(), ApiError> {
        self.probes.set(self.probes.get() + 1);
        if self.reachable.get() {
            Ok(())
        } else {
            Err(ApiError::Network("probe failed".into()))
        }
    }
}
