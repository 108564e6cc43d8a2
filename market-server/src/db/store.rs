//! Storage trait and errors

use async_trait::async_trait;
use shared::models::{
    Cart, Notification, Order, OrderItem, OrderQuery, OrderStatus, Product, RatingSummary,
    Review, TrackingEvent, User,
};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Compare-and-set lost: the row no longer holds the expected value
    #[error("Stale write on {entity} {id}")]
    Stale { entity: &'static str, id: String },

    /// Backend unreachable or overloaded; the caller may retry
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                AppError::not_found(entity).with_detail("id", id)
            }
            StoreError::Conflict(msg) => AppError::conflict(msg),
            StoreError::Stale { entity, id } => AppError::with_message(
                ErrorCode::OrderConcurrentModification,
                format!("{entity} {id} was modified concurrently"),
            )
            .with_detail("retryable", true),
            StoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Storage unavailable");
                AppError::unavailable("Storage temporarily unavailable")
            }
            StoreError::Serialization(msg) | StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "Storage failure");
                AppError::database("Database operation failed")
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whose orders to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFilter {
    Buyer(String),
    /// Orders containing at least one item of this seller
    Seller(String),
    All,
}

/// Order item lookup. Every set field must match; status applies to the parent order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderItemFilter {
    pub buyer_id: Option<String>,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderItemFilter {
    pub fn matches(&self, order: &Order, item: &OrderItem) -> bool {
        self.buyer_id.as_deref().is_none_or(|b| order.buyer_id == b)
            && self.status.is_none_or(|s| order.status == s)
            && self.product_id.as_deref().is_none_or(|p| item.product_id == p)
            && self.seller_id.as_deref().is_none_or(|s| item.seller_id == s)
    }
}

/// Compare-and-set status write
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub expected: OrderStatus,
    pub next: OrderStatus,
    pub event: TrackingEvent,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

/// Marketplace storage
///
/// Implementations must make `update_order_status` a compare-and-set on the
/// current status and must reject a second review for the same
/// (product, buyer) pair with [`StoreError::Conflict`]. Review writes refresh
/// the product's rating in the same atomic step, serialized per product
/// across every process sharing the backend.
#[async_trait]
pub trait MarketStore: Send + Sync + std::fmt::Debug {
    // ========== Users ==========

    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    // ========== Products ==========

    async fn create_product(&self, product: &Product) -> StoreResult<()>;
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;

    // ========== Carts ==========

    /// Empty cart when the buyer has none yet
    async fn get_cart(&self, buyer_id: &str) -> StoreResult<Cart>;
    async fn save_cart(&self, cart: &Cart) -> StoreResult<()>;

    // ========== Orders ==========

    /// Insert a new order and empty the buyer's cart in one step
    async fn place_order(&self, order: &Order) -> StoreResult<()>;
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>>;
    /// Fails with `Stale` when the stored status is not `change.expected`
    async fn update_order_status(&self, id: &str, change: &StatusChange) -> StoreResult<Order>;
    /// Newest first, paginated. Returns the page and the total match count.
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        query: &OrderQuery,
    ) -> StoreResult<(Vec<Order>, u64)>;
    async fn find_order_items(&self, filter: &OrderItemFilter) -> StoreResult<Vec<OrderItem>>;

    // ========== Reviews ==========

    async fn find_review(&self, product_id: &str, buyer_id: &str) -> StoreResult<Option<Review>>;
    async fn get_review(&self, id: &str) -> StoreResult<Option<Review>>;
    /// Insert and refresh the product rating. Fails with `Conflict` when the
    /// buyer already reviewed the product, `NotFound` when the product is gone.
    async fn create_review(&self, review: &Review) -> StoreResult<RatingSummary>;
    /// Write rating and comment, then refresh the product rating
    async fn update_review(&self, review: &Review) -> StoreResult<RatingSummary>;
    /// Remove the review and refresh the product rating
    async fn delete_review(&self, id: &str) -> StoreResult<(Review, RatingSummary)>;
    /// Newest first
    async fn list_reviews(&self, product_id: &str) -> StoreResult<Vec<Review>>;

    // ========== Notifications ==========

    async fn create_notification(&self, notification: &Notification) -> StoreResult<()>;
    /// Newest first
    async fn list_notifications(&self, recipient_id: &str) -> StoreResult<Vec<Notification>>;

    /// Liveness check for /health
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
