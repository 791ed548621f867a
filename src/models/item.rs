use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ITEM - Entrada de stock vista desde el cliente
// ============================================================================

/// Identificador de un item de stock.
///
/// Los ids de servidor se serializan como números JSON y los locales como
/// strings, así los snapshots de builds anteriores siguen decodificando.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// Asignado por el backend, estable
    Server(i64),
    /// Asignado en el cliente para items creados offline
    Local(String),
}

impl ItemId {
    pub fn is_local(&self) -> bool {
        matches!(self, ItemId::Local(_))
    }

    pub fn server_id(&self) -> Option<i64> {
        match self {
            ItemId::Server(id) => Some(*id),
            ItemId::Local(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Server(id) => write!(f, "{}", id),
            ItemId::Local(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Server(id)
    }
}

/// Campos de negocio de una entrada de stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ItemData {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supplier: None,
            quantity,
            unit: unit.into(),
            price: None,
            date: None,
        }
    }

    /// Sobrescribe los campos presentes en `patch`
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(supplier) = &patch.supplier {
            self.supplier = Some(supplier.clone());
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = &patch.unit {
            self.unit = unit.clone();
        }
        if let Some(price) = patch.price {
            self.price = Some(price);
        }
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
    }

    /// Primer problema de validación, si hay
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("name must not be empty".to_string());
        }
        if self.unit.trim().is_empty() {
            return Some("unit must not be empty".to_string());
        }
        validate_amounts(Some(self.quantity), self.price)
    }
}

/// Update parcial de un item. Los campos ausentes no se tocan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ItemPatch {
    pub fn quantity(quantity: f64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Option<String> {
        if self.is_empty() {
            return Some("update carries no fields".to_string());
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Some("name must not be empty".to_string());
        }
        if matches!(&self.unit, Some(unit) if unit.trim().is_empty()) {
            return Some("unit must not be empty".to_string());
        }
        validate_amounts(self.quantity, self.price)
    }
}

fn validate_amounts(quantity: Option<f64>, price: Option<f64>) -> Option<String> {
    if let Some(quantity) = quantity {
        if !quantity.is_finite() || quantity < 0.0 {
            return Some(format!("invalid quantity {}", quantity));
        }
    }
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Some(format!("invalid price {}", price));
        }
    }
    None
}

/// Entrada de stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(flatten)]
    pub data: ItemData,
    /// Timestamp de última modificación
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, data: ItemData) -> Self {
        Self {
            id: id.into(),
            data,
            updated_at: None,
        }
    }
}
