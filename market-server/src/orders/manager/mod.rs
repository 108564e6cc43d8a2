//! OrdersManager - the single writer of order status
//!
//! Every status change goes through [`OrdersManager::transition`]:
//! per-order lock, state machine check, compare-and-set write, then the
//! buyer notification and the cancellation side effect.

mod error;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};

use shared::models::{
    Identity, Order, OrderPage, OrderQuery, OrderStatus, OrderTracking, Pagination,
    StatusChangeRequest, TrackingEvent,
};
use shared::util::now_millis;
use std::sync::Arc;

use crate::db::{AggregateLocks, MarketStore, OrderFilter, StatusChange, StoreError};
use crate::orders::inventory::InventoryReleaser;
use crate::orders::notify::OrderNotifier;
use crate::orders::state_machine::{check_transition, is_party};

#[derive(Debug, Clone)]
pub struct OrdersManager {
    store: Arc<dyn MarketStore>,
    locks: Arc<AggregateLocks>,
    inventory: Arc<dyn InventoryReleaser>,
    notifier: Arc<dyn OrderNotifier>,
}

impl OrdersManager {
    pub fn new(
        store: Arc<dyn MarketStore>,
        locks: Arc<AggregateLocks>,
        inventory: Arc<dyn InventoryReleaser>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            store,
            locks,
            inventory,
            notifier,
        }
    }

    async fn load(&self, order_id: &str) -> OrderResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Fetch an order visible to `actor`
    pub async fn get(&self, order_id: &str, actor: &Identity) -> OrderResult<Order> {
        let order = self.load(order_id).await?;
        if !is_party(&order, actor) {
            return Err(OrderError::NotParty {
                order_id: order_id.to_string(),
                actor: actor.role(),
            });
        }
        Ok(order)
    }

    /// Tracking history of an order visible to `actor`
    pub async fn tracking(&self, order_id: &str, actor: &Identity) -> OrderResult<OrderTracking> {
        self.get(order_id, actor).await.map(|o| OrderTracking::from(&o))
    }

    /// Orders of the buyer, orders containing the seller's items, or all orders for admins
    pub async fn list(&self, actor: &Identity, query: &OrderQuery) -> OrderResult<OrderPage> {
        let filter = match actor {
            Identity::Buyer { buyer_id, .. } => OrderFilter::Buyer(buyer_id.clone()),
            Identity::Seller { seller_id, .. } => OrderFilter::Seller(seller_id.clone()),
            Identity::Admin { .. } => OrderFilter::All,
        };
        let (orders, total) = self.store.list_orders(&filter, query).await?;
        Ok(OrderPage {
            orders,
            pagination: Pagination::new(total, query),
        })
    }

    /// Move an order to `request.status` on behalf of `actor`
    pub async fn transition(
        &self,
        order_id: &str,
        request: StatusChangeRequest,
        actor: &Identity,
    ) -> OrderResult<Order> {
        let _guard = self.locks.acquire(&format!("order:{order_id}")).await;

        let order = self.load(order_id).await?;
        let target = request.status;
        check_transition(&order, target, actor)?;

        let shipping = target == OrderStatus::Shipped;
        let change = StatusChange {
            expected: order.status,
            next: target,
            event: TrackingEvent {
                status: target,
                note: request.note,
                location: request.location,
                actor_role: actor.role(),
                at: now_millis(),
            },
            tracking_number: request.tracking_number.filter(|_| shipping),
            carrier: request.carrier.filter(|_| shipping),
        };

        let updated = match self.store.update_order_status(order_id, &change).await {
            Ok(order) => order,
            Err(StoreError::Stale { .. }) => {
                tracing::warn!(order_id = %order_id, "Order status changed underneath transition");
                return Err(OrderError::ConcurrentModification(order_id.to_string()));
            }
            Err(StoreError::NotFound { .. }) => {
                return Err(OrderError::NotFound(order_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            order_id = %order_id,
            from = %order.status,
            to = %target,
            actor = %actor.user_id(),
            role = %actor.role(),
            "Order status changed"
        );

        if let Err(e) = self.notifier.order_updated(&updated, &change.event).await {
            // The status change stands
            tracing::error!(order_id = %order_id, error = %e, "Buyer notification failed");
        }

        if target == OrderStatus::Cancelled
            && let Err(e) = self.inventory.release(&updated).await
        {
            // Cancellation is not rolled back
            tracing::error!(order_id = %order_id, error = %e, "Inventory release failed");
        }

        Ok(updated)
    }
}
