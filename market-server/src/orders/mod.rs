//! Order lifecycle
//!
//! - **state_machine**: pure transition rules (legality + who may do what)
//! - **manager**: OrdersManager, the only writer of order status
//! - **inventory**: collaborator notified when an order is cancelled
//! - **notify**: buyer notification after every status change
//!
//! # Data Flow
//!
//! ```text
//! POST /api/orders/{id}/status
//!        ↓
//! OrdersManager::transition ── per-order lock
//!        ↓
//! state_machine::check_transition(order, target, actor)
//!        ↓
//! MarketStore::update_order_status (compare-and-set on status)
//!        ↓
//! OrderNotifier::order_updated, CANCELLED → InventoryReleaser::release
//! ```

pub mod inventory;
pub mod manager;
pub mod notify;
pub mod state_machine;

pub use inventory::{InventoryError, InventoryReleaser, LoggingInventory};
pub use manager::{OrderError, OrdersManager};
pub use notify::{NotifyError, OrderNotifier, StoreNotifier};
pub use state_machine::{TransitionError, check_transition, is_party};
