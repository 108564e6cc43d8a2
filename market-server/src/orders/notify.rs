//! Buyer notifications
//!
//! Called after every successful status change so the buyer hears about it.

use async_trait::async_trait;
use shared::models::{Notification, NotificationKind, Order, TrackingEvent};
use shared::util::new_id;
use std::sync::Arc;
use thiserror::Error;

use crate::db::{MarketStore, StoreError};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification for order {order_id} not recorded: {source}")]
    Store {
        order_id: String,
        #[source]
        source: StoreError,
    },
}

#[async_trait]
pub trait OrderNotifier: Send + Sync + std::fmt::Debug {
    async fn order_updated(&self, order: &Order, event: &TrackingEvent) -> Result<(), NotifyError>;
}

/// `Order #<id> <STATUS>` followed by the note when one was given
pub fn update_message(order: &Order, event: &TrackingEvent) -> String {
    match event.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("Order #{} {}: {}", order.id, event.status, note),
        None => format!("Order #{} {}", order.id, event.status),
    }
}

/// Writes an `ORDER_UPDATE` notification for the buyer into the store
#[derive(Debug, Clone)]
pub struct StoreNotifier {
    store: Arc<dyn MarketStore>,
}

impl StoreNotifier {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrderNotifier for StoreNotifier {
    async fn order_updated(&self, order: &Order, event: &TrackingEvent) -> Result<(), NotifyError> {
        let notification = Notification {
            id: new_id(),
            recipient_id: order.buyer_id.clone(),
            kind: NotificationKind::OrderUpdate,
            message: update_message(order, event),
            order_id: Some(order.id.clone()),
            created_at: event.at,
        };
        self.store
            .create_notification(&notification)
            .await
            .map_err(|source| NotifyError::Store {
                order_id: order.id.clone(),
                source,
            })
    }
}
