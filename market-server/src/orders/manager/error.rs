use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use thiserror::Error;

use crate::db::StoreError;
use crate::orders::state_machine::TransitionError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Not a party to order {order_id}")]
    NotParty { order_id: String, actor: Role },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", id)
            }
            OrderError::NotParty { order_id, actor } => AppError::with_message(
                ErrorCode::NotOrderParty,
                format!("Not a party to order {order_id}"),
            )
            .with_detail("redirect", actor.home_path()),
            OrderError::Transition(TransitionError::Unauthorized {
                order_id,
                from,
                to,
                actor,
            }) => AppError::forbidden_redirect(
                format!("{actor} may not move order {order_id} from {from} to {to}"),
                actor.home_path(),
            ),
            OrderError::Transition(TransitionError::IllegalTransition { from, to }) => {
                AppError::with_message(
                    ErrorCode::IllegalTransition,
                    format!("Illegal transition {from} -> {to}"),
                )
                .with_detail("from", from.as_str())
                .with_detail("to", to.as_str())
            }
            OrderError::ConcurrentModification(id) => {
                AppError::new(ErrorCode::OrderConcurrentModification)
                    .with_detail("orderId", id)
                    .with_detail("retryable", true)
            }
            OrderError::Storage(e) => e.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderStatus;

    #[test]
    fn test_illegal_transition_names_both_states() {
        let err: AppError = OrderError::from(TransitionError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        })
        .into();
        assert_eq!(err.code, ErrorCode::IllegalTransition);
        assert_eq!(err.message, "Illegal transition DELIVERED -> PROCESSING");
        assert_eq!(err.detail_str("from"), Some("DELIVERED"));
    }

    #[test]
    fn test_unauthorized_redirects_home() {
        let err: AppError = OrderError::from(TransitionError::Unauthorized {
            order_id: "o1".into(),
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
            actor: Role::Buyer,
        })
        .into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.detail_str("redirect"), Some("/buyer"));
    }

    #[test]
    fn test_storage_unavailable_is_503() {
        let err: AppError = OrderError::from(StoreError::Unavailable("down".into())).into();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert_eq!(err.http_status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
