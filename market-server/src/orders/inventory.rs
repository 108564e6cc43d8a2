//! Inventory collaborator
//!
//! Called after an order reaches CANCELLED so reserved stock can be returned.

use async_trait::async_trait;
use shared::models::Order;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Inventory release failed for order {order_id}: {reason}")]
    ReleaseFailed { order_id: String, reason: String },
}

#[async_trait]
pub trait InventoryReleaser: Send + Sync + std::fmt::Debug {
    async fn release(&self, order: &Order) -> Result<(), InventoryError>;
}

/// Records releases in the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInventory;

#[async_trait]
impl InventoryReleaser for LoggingInventory {
    async fn release(&self, order: &Order) -> Result<(), InventoryError> {
        for item in &order.items {
            tracing::info!(
                order_id = %order.id,
                product_id = %item.product_id,
                quantity = item.quantity,
                "Inventory released"
            );
        }
        Ok(())
    }
}
