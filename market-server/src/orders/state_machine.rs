//! Order state machine
//!
//! ```text
//! PENDING ──► PROCESSING ──► SHIPPED ──► DELIVERED
//!    │             │            │
//!    └─────────────┴────────────┴──────► CANCELLED
//! ```
//!
//! Forward moves may skip states. DELIVERED and CANCELLED are terminal.
//!
//! | Move | Allowed actors |
//! |------|----------------|
//! | forward | seller owning an item of the order |
//! | cancel from PENDING / PROCESSING | owning buyer, admin |
//! | cancel from SHIPPED | seller owning an item, admin |

use shared::models::{Identity, Order, OrderStatus, Role};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{actor} is not allowed to move order {order_id} from {from} to {to}")]
    Unauthorized {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
        actor: Role,
    },

    #[error("Illegal transition {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// Whether `actor` is a party to `order`: its buyer, a seller of one of its
/// items, or an admin.
pub fn is_party(order: &Order, actor: &Identity) -> bool {
    match actor {
        Identity::Admin { .. } => true,
        Identity::Buyer { buyer_id, .. } => order.buyer_id == *buyer_id,
        Identity::Seller { seller_id, .. } => order.has_seller(seller_id),
    }
}

/// Decide whether `actor` may move `order` to `target`.
///
/// Checks run in this order: party membership, legality of the move, then
/// the role rule for the move.
pub fn check_transition(
    order: &Order,
    target: OrderStatus,
    actor: &Identity,
) -> Result<(), TransitionError> {
    let from = order.status;
    let unauthorized = || TransitionError::Unauthorized {
        order_id: order.id.clone(),
        from,
        to: target,
        actor: actor.role(),
    };

    if !is_party(order, actor) {
        return Err(unauthorized());
    }

    if !from.can_transition_to(target) {
        return Err(TransitionError::IllegalTransition { from, to: target });
    }

    let allowed = match (target, actor) {
        (OrderStatus::Cancelled, Identity::Admin { .. }) => true,
        (OrderStatus::Cancelled, Identity::Buyer { .. }) => {
            matches!(from, OrderStatus::Pending | OrderStatus::Processing)
        }
        (OrderStatus::Cancelled, Identity::Seller { .. }) => from == OrderStatus::Shipped,
        (_, Identity::Seller { .. }) => true,
        (_, _) => false,
    };

    if allowed { Ok(()) } else { Err(unauthorized()) }
}
