//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::identity::Role;

/// Order lifecycle status
///
/// `PENDING -> PROCESSING -> SHIPPED -> DELIVERED`, with `CANCELLED`
/// reachable from every state before `DELIVERED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Position on the forward path. `None` for `CANCELLED`.
    const fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Delivered items may be reviewed by the buyer
    pub const fn is_reviewable(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Whether `target` is reachable from `self` in one transition.
    ///
    /// Forward moves may skip states. Staying in place is never a transition.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), target.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// One line of an order, owned by a single seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub quantity: u32,
    /// Unit price captured at checkout
    pub price: Decimal,
}

/// Largest order total storage accepts (`NUMERIC(14, 2)`)
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

impl OrderItem {
    /// `None` when price times quantity leaves the `Decimal` range
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of all line totals, `None` on overflow
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Option<Decimal> {
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Entry in an order's tracking history, one per successful transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub actor_role: Role,
    /// Unix millis
    pub at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_history: Vec<TrackingEvent>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn has_seller(&self, seller_id: &str) -> bool {
        self.items.iter().any(|item| item.seller_id == seller_id)
    }

    pub fn has_product(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}

/// Tracking view of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub order_id: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub history: Vec<TrackingEvent>,
    pub created_at: i64,
}

impl From<&Order> for OrderTracking {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            status: order.status,
            tracking_number: order.tracking_number.clone(),
            carrier: order.carrier.clone(),
            history: order.tracking_history.clone(),
            created_at: order.created_at,
        }
    }
}

/// Status change request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

/// Listing query for buyer and seller order lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl OrderQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Rows to skip. Computed in u64 so huge page numbers cannot overflow.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1).saturating_mul(u64::from(self.limit()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub pages: u64,
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(total: u64, query: &OrderQuery) -> Self {
        let limit = query.limit();
        Self {
            total,
            pages: total.div_ceil(u64::from(limit)),
            page: query.page(),
            limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_backward_and_self_transitions_rejected() {
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Processing));
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn test_cancel_reachable_before_delivery() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        for target in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
        assert!(Delivered.is_reviewable());
        assert!(!Cancelled.is_reviewable());
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(Shipped));
        assert!("LOST".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&Delivered).unwrap(), "\"DELIVERED\"");
    }

    #[test]
    fn test_order_query_bounds() {
        let query = OrderQuery {
            status: None,
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), OrderQuery::MAX_LIMIT);
        assert_eq!(query.offset(), 0);

        let query = OrderQuery {
            page: Some(3),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(query.offset(), 10);
        assert_eq!(Pagination::new(11, &query).pages, 3);

        let query = OrderQuery {
            page: Some(u32::MAX),
            limit: Some(100),
            ..Default::default()
        };
        assert_eq!(query.offset(), u64::from(u32::MAX - 1) * 100);
        assert_eq!(Pagination::new(3, &query).page, u32::MAX);
    }

    fn item(price: Decimal, quantity: u32) -> OrderItem {
        OrderItem {
            id: "i".into(),
            order_id: "o".into(),
            product_id: "p".into(),
            seller_id: "s".into(),
            quantity,
            price,
        }
    }

    #[test]
    fn test_order_total() {
        let items = [item(Decimal::new(1999, 2), 2), item(Decimal::new(250, 2), 4)];
        assert_eq!(order_total(&items), Some(Decimal::new(4998, 2)));
        assert_eq!(order_total(Vec::new()), Some(Decimal::ZERO));
        assert_eq!(MAX_ORDER_TOTAL.to_string(), "999999999999.99");
    }

    #[test]
    fn test_order_total_overflow_is_none() {
        let huge = item(Decimal::MAX, 2);
        assert_eq!(huge.line_total(), None);
        assert_eq!(order_total(&[huge]), None);

        let half = item(Decimal::MAX / Decimal::TWO, 1);
        assert_eq!(order_total(&[half.clone(), half.clone(), half]), None);
    }
}
