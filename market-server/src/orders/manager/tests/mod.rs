use super::*;
use crate::db::MemoryStore;
use crate::orders::inventory::InventoryError;
use crate::orders::notify::NotifyError;
use crate::orders::TransitionError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderItem, Role, ShippingAddress};
use std::sync::Mutex;

mod test_transitions;

/// Remembers which orders were released; can be told to fail
#[derive(Debug, Default)]
struct RecordingInventory {
    released: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl InventoryReleaser for RecordingInventory {
    async fn release(&self, order: &Order) -> Result<(), crate::orders::InventoryError> {
        if self.fail {
            return Err(InventoryError::ReleaseFailed {
                order_id: order.id.clone(),
                reason: "warehouse offline".into(),
            });
        }
        self.released.lock().unwrap().push(order.id.clone());
        Ok(())
    }
}

/// Keeps (recipient, message) pairs; can be told to fail
#[derive(Debug, Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn order_updated(&self, order: &Order, event: &TrackingEvent) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Store {
                order_id: order.id.clone(),
                source: crate::db::StoreError::Unavailable("mail relay down".into()),
            });
        }
        self.sent.lock().unwrap().push((
            order.buyer_id.clone(),
            crate::orders::notify::update_message(order, event),
        ));
        Ok(())
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    inventory: Arc<RecordingInventory>,
    notifier: Arc<RecordingNotifier>,
    manager: OrdersManager,
}

fn fixture_with(inventory: RecordingInventory, notifier: RecordingNotifier) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let inventory = Arc::new(inventory);
    let notifier = Arc::new(notifier);
    let manager = OrdersManager::new(
        store.clone(),
        Arc::new(AggregateLocks::new()),
        inventory.clone(),
        notifier.clone(),
    );
    Fixture {
        store,
        inventory,
        notifier,
        manager,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingInventory::default(), RecordingNotifier::default())
}

fn buyer(n: u32) -> Identity {
    Identity::Buyer {
        user_id: format!("ub{n}"),
        buyer_id: format!("B{n}"),
    }
}

fn seller(n: u32) -> Identity {
    Identity::Seller {
        user_id: format!("us{n}"),
        seller_id: format!("S{n}"),
    }
}

fn admin() -> Identity {
    Identity::Admin {
        user_id: "ua".into(),
    }
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Test Buyer".into(),
        address: "1 Main St".into(),
        state: "CA".into(),
        country: "US".into(),
        zip_code: "94000".into(),
        email: None,
        phone_number: None,
    }
}

/// Order `id` of buyer B1 with one item of product P1 sold by S1
async fn seed_order(store: &MemoryStore, id: &str, created_at: i64) -> Order {
    let order = Order {
        id: id.to_string(),
        buyer_id: "B1".into(),
        status: OrderStatus::Pending,
        items: vec![OrderItem {
            id: format!("{id}-i1"),
            order_id: id.to_string(),
            product_id: "P1".into(),
            seller_id: "S1".into(),
            quantity: 2,
            price: Decimal::new(1250, 2),
        }],
        total_amount: Decimal::new(2500, 2),
        currency: "USD".into(),
        shipping_address: address(),
        tracking_number: None,
        carrier: None,
        tracking_history: Vec::new(),
        created_at,
        updated_at: created_at,
    };
    store.place_order(&order).await.unwrap();
    order
}

fn to(status: OrderStatus) -> StatusChangeRequest {
    StatusChangeRequest {
        status,
        note: None,
        location: None,
        tracking_number: None,
        carrier: None,
    }
}
