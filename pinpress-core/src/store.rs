//! Order Store
//!
//! JSON-backed stand-in for the hosted table store: create, list, status
//! updates and a change feed. `create_order` always runs the draft
//! validator; there is no unchecked insert.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use thiserror::Error;
use uuid::Uuid;

use crate::order::{Order, OrderDraft, OrderStatus};
use crate::validation::Validator;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { id: Uuid },
    StatusChanged { id: Uuid, status: OrderStatus },
    Cleared,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn status(status: OrderStatus) -> Self {
        Self { status: Some(status) }
    }

    fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
    }
}

pub trait OrderStore {
    fn create_order(&mut self, draft: OrderDraft) -> Result<Order, StoreError>;
    fn list_orders(&self, filter: Option<OrderFilter>) -> Result<Vec<Order>, StoreError>;
    fn get_order(&self, id: Uuid) -> Result<Order, StoreError>;
    fn update_status(&mut self, id: Uuid, status: OrderStatus) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
    fn subscribe(&mut self) -> Receiver<OrderEvent>;
}

/// Orders kept in memory, optionally mirrored to a JSON file after every
/// mutation.
pub struct JsonOrderStore {
    orders: Vec<Order>,
    path: Option<PathBuf>,
    validator: Validator,
    subscribers: Vec<Sender<OrderEvent>>,
}

impl JsonOrderStore {
    pub fn in_memory() -> Self {
        Self {
            orders: vec![],
            path: None,
            validator: Validator::new(),
            subscribers: vec![],
        }
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let orders = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                vec![]
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            vec![]
        };
        tracing::debug!(path = %path.display(), orders = orders.len(), "order store opened");
        Ok(Self {
            orders,
            path: Some(path),
            ..Self::in_memory()
        })
    }

    /// Write `orders` to the backing file. Callers swap them into memory
    /// only after this succeeds.
    fn persist(&self, orders: &[Order]) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(orders)?)?;
        }
        Ok(())
    }

    fn notify(&mut self, event: OrderEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl OrderStore for JsonOrderStore {
    fn create_order(&mut self, draft: OrderDraft) -> Result<Order, StoreError> {
        let validation = self.validator.validate(&draft);
        if !validation.valid {
            tracing::info!(reason = %validation.summary(), "order rejected");
            return Err(StoreError::Rejected(validation.summary()));
        }
        if !validation.violations.is_empty() {
            tracing::warn!(notes = %validation.summary(), "order accepted with warnings");
        }

        let order = Order::new(draft);
        let mut next = self.orders.clone();
        next.push(order.clone());
        self.persist(&next)?;
        self.orders = next;
        tracing::info!(id = %order.id, name = %order.name(), qty = order.quantity(), "order created");
        self.notify(OrderEvent::Created { id: order.id });
        Ok(order)
    }

    fn list_orders(&self, filter: Option<OrderFilter>) -> Result<Vec<Order>, StoreError> {
        let filter = filter.unwrap_or_default();
        Ok(self.orders.iter().filter(|o| filter.matches(o)).cloned().collect())
    }

    fn get_order(&self, id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update_status(&mut self, id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let index = self
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let mut next = self.orders.clone();
        next[index].status = status;
        self.persist(&next)?;
        self.orders = next;
        tracing::info!(%id, ?status, "order status updated");
        self.notify(OrderEvent::StatusChanged { id, status });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        self.orders.clear();
        tracing::warn!("all orders cleared");
        self.notify(OrderEvent::Cleared);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<OrderEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }
}
