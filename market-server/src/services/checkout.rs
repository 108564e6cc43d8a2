//! Checkout: cart to PENDING order
//!
//! Prices and sellers come from the catalogue at checkout time; the client
//! only chooses currency and shipping address. Payment capture happens
//! outside this service.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    MAX_ORDER_TOTAL, Order, OrderItem, OrderStatus, Role, ShippingAddress, TrackingEvent,
    order_total,
};
use shared::util::{new_id, now_millis};
use std::sync::Arc;

use super::cart_key;
use crate::db::{AggregateLocks, MarketStore};
use crate::utils::validation::{normalize_currency, validate_shipping_address};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// ISO 4217 code, any case
    pub currency: String,
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone)]
pub struct CheckoutService {
    store: Arc<dyn MarketStore>,
    locks: Arc<AggregateLocks>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn MarketStore>, locks: Arc<AggregateLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn checkout(&self, buyer_id: &str, req: CheckoutRequest) -> AppResult<Order> {
        let currency = normalize_currency(&req.currency)?;
        validate_shipping_address(&req.shipping_address)?;

        let _guard = self.locks.acquire(&cart_key(buyer_id)).await;

        let cart = self.store.get_cart(buyer_id).await?;
        if cart.is_empty() {
            return Err(AppError::new(ErrorCode::CartEmpty));
        }

        let order_id = new_id();
        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .store
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::ProductNotFound)
                        .with_detail("productId", line.product_id.clone())
                })?;
            items.push(OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                product_id: product.id,
                seller_id: product.seller_id,
                quantity: line.quantity,
                price: product.price,
            });
        }
        let total_amount = order_total(&items)
            .filter(|total| *total <= MAX_ORDER_TOTAL)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ValueOutOfRange,
                    "Order total exceeds the supported maximum",
                )
                .with_detail("field", "totalAmount")
                .with_detail("max", MAX_ORDER_TOTAL.to_string())
            })?;

        let now = now_millis();
        let order = Order {
            id: order_id,
            buyer_id: buyer_id.to_string(),
            status: OrderStatus::Pending,
            items,
            total_amount,
            currency,
            shipping_address: req.shipping_address,
            tracking_number: None,
            carrier: None,
            tracking_history: vec![TrackingEvent {
                status: OrderStatus::Pending,
                note: Some("Order placed".to_string()),
                location: None,
                actor_role: Role::Buyer,
                at: now,
            }],
            created_at: now,
            updated_at: now,
        };
        self.store.place_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            buyer_id = %buyer_id,
            items = order.items.len(),
            total = %order.total_amount,
            currency = %order.currency,
            "Order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal::Decimal;
    use shared::models::{Cart, MAX_PRICE, Product};

    async fn add_product(store: &MemoryStore, id: &str, seller: &str, price: Decimal) {
        store
            .create_product(&Product {
                id: id.into(),
                seller_id: seller.into(),
                name: id.into(),
                description: String::new(),
                price,
                rating: 0.0,
                review_count: 0,
                created_at: 1,
            })
            .await
            .unwrap();
    }

    async fn setup() -> (Arc<MemoryStore>, CheckoutService) {
        let store = Arc::new(MemoryStore::new());
        add_product(&store, "P1", "S1", Decimal::new(1000, 2)).await;
        add_product(&store, "P2", "S2", Decimal::new(250, 2)).await;
        let service = CheckoutService::new(store.clone(), Arc::new(AggregateLocks::new()));
        (store, service)
    }

    fn request(currency: &str) -> CheckoutRequest {
        CheckoutRequest {
            currency: currency.into(),
            shipping_address: ShippingAddress {
                full_name: "Ann Buyer".into(),
                address: "1 Main St".into(),
                state: "CA".into(),
                country: "US".into(),
                zip_code: "94000".into(),
                email: Some("ann@example.com".into()),
                phone_number: None,
            },
        }
    }

    async fn fill_cart(store: &MemoryStore) {
        let mut cart = Cart::empty("B1");
        cart.add("P1", 2, || "l1".to_string());
        cart.add("P2", 4, || "l2".to_string());
        store.save_cart(&cart).await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_prices_from_catalogue() {
        let (store, service) = setup().await;
        fill_cart(&store).await;

        let order = service.checkout("B1", request("usd")).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.currency, "USD");
        assert_eq!(order.total_amount, Decimal::new(3000, 2));
        assert!(order.has_seller("S1") && order.has_seller("S2"));
        assert_eq!(order.tracking_history.len(), 1);

        assert!(store.get_cart("B1").await.unwrap().is_empty());
        assert!(store.get_order(&order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (_store, service) = setup().await;
        let err = service.checkout("B1", request("USD")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartEmpty);
    }

    #[tokio::test]
    async fn test_invalid_currency_and_address() {
        let (store, service) = setup().await;
        fill_cart(&store).await;

        let err = service.checkout("B1", request("DOLLARS")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCurrency);

        let mut req = request("EUR");
        req.shipping_address.full_name.clear();
        let err = service.checkout("B1", req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidShippingAddress);

        // Nothing was consumed
        assert_eq!(store.get_cart("B1").await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_total_out_of_range_is_rejected() {
        let (store, service) = setup().await;
        // Written past the catalogue's price check
        add_product(&store, "HUGE", "S1", Decimal::MAX).await;
        add_product(&store, "DEAR", "S1", MAX_PRICE).await;

        for (product, quantity) in [("HUGE", 2), ("DEAR", 999)] {
            let mut cart = Cart::empty("B1");
            cart.add(product, quantity, || "l1".to_string());
            store.save_cart(&cart).await.unwrap();

            let err = service.checkout("B1", request("USD")).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::ValueOutOfRange, "{product}");
            assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
            assert_eq!(store.get_cart("B1").await.unwrap().items.len(), 1);
        }

        let mut cart = Cart::empty("B1");
        cart.add("DEAR", 9, || "l1".to_string());
        store.save_cart(&cart).await.unwrap();
        let order = service.checkout("B1", request("USD")).await.unwrap();
        assert_eq!(order.total_amount, MAX_PRICE * Decimal::from(9));
    }
}
