//! Buyer cart

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Cart, CartItemCreate};
use shared::util::new_id;
use std::sync::Arc;

use super::cart_key;
use crate::db::{AggregateLocks, MarketStore};

/// Upper bound for one cart line
pub const MAX_LINE_QUANTITY: u32 = 999;

fn check_quantity(quantity: u32) -> AppResult<u32> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(quantity)
    } else {
        Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"),
        )
        .with_detail("quantity", quantity))
    }
}

#[derive(Debug, Clone)]
pub struct CartService {
    store: Arc<dyn MarketStore>,
    locks: Arc<AggregateLocks>,
}

impl CartService {
    pub fn new(store: Arc<dyn MarketStore>, locks: Arc<AggregateLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn get(&self, buyer_id: &str) -> AppResult<Cart> {
        Ok(self.store.get_cart(buyer_id).await?)
    }

    /// Add a product; an existing line for it grows instead
    pub async fn add(&self, buyer_id: &str, input: CartItemCreate) -> AppResult<Cart> {
        let quantity = check_quantity(input.quantity)?;
        if self.store.get_product(&input.product_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::ProductNotFound)
                .with_detail("productId", input.product_id));
        }

        let _guard = self.locks.acquire(&cart_key(buyer_id)).await;
        let mut cart = self.store.get_cart(buyer_id).await?;
        cart.add(&input.product_id, quantity, new_id);
        if let Some(item) = cart.items.iter().find(|i| i.product_id == input.product_id) {
            check_quantity(item.quantity)?;
        }
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn update(&self, buyer_id: &str, item_id: &str, quantity: u32) -> AppResult<Cart> {
        let quantity = check_quantity(quantity)?;

        let _guard = self.locks.acquire(&cart_key(buyer_id)).await;
        let mut cart = self.store.get_cart(buyer_id).await?;
        if !cart.set_quantity(item_id, quantity) {
            return Err(AppError::new(ErrorCode::CartItemNotFound).with_detail("itemId", item_id));
        }
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn remove(&self, buyer_id: &str, item_id: &str) -> AppResult<Cart> {
        let _guard = self.locks.acquire(&cart_key(buyer_id)).await;
        let mut cart = self.store.get_cart(buyer_id).await?;
        if !cart.remove(item_id) {
            return Err(AppError::new(ErrorCode::CartItemNotFound).with_detail("itemId", item_id));
        }
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn clear(&self, buyer_id: &str) -> AppResult<Cart> {
        let _guard = self.locks.acquire(&cart_key(buyer_id)).await;
        let cart = Cart::empty(buyer_id);
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal::Decimal;
    use shared::models::Product;

    async fn setup() -> CartService {
        let store = Arc::new(MemoryStore::new());
        store
            .create_product(&Product {
                id: "P1".into(),
                seller_id: "S1".into(),
                name: "Mug".into(),
                description: String::new(),
                price: Decimal::new(800, 2),
                rating: 0.0,
                review_count: 0,
                created_at: 1,
            })
            .await
            .unwrap();
        CartService::new(store, Arc::new(AggregateLocks::new()))
    }

    fn add(quantity: u32) -> CartItemCreate {
        CartItemCreate {
            product_id: "P1".into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_add_merges_lines() {
        let carts = setup().await;
        carts.add("B1", add(1)).await.unwrap();
        let cart = carts.add("B1", add(2)).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(carts.get("B1").await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_update_remove_clear() {
        let carts = setup().await;
        let cart = carts.add("B1", add(1)).await.unwrap();
        let item_id = cart.items[0].id.clone();

        let cart = carts.update("B1", &item_id, 5).await.unwrap();
        assert_eq!(cart.items[0].quantity, 5);

        let err = carts.update("B1", "nope", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartItemNotFound);

        assert!(carts.remove("B1", &item_id).await.unwrap().is_empty());
        assert_eq!(
            carts.remove("B1", &item_id).await.unwrap_err().code,
            ErrorCode::CartItemNotFound
        );

        carts.add("B1", add(1)).await.unwrap();
        assert!(carts.clear("B1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_lines() {
        let carts = setup().await;
        assert_eq!(carts.add("B1", add(0)).await.unwrap_err().code, ErrorCode::InvalidQuantity);
        let err = carts
            .add(
                "B1",
                CartItemCreate {
                    product_id: "ghost".into(),
                    quantity: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);

        carts.add("B1", add(MAX_LINE_QUANTITY)).await.unwrap();
        assert_eq!(carts.add("B1", add(1)).await.unwrap_err().code, ErrorCode::InvalidQuantity);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let carts = Arc::new(setup().await);
        let tasks = (0..10).map(|_| {
            let carts = carts.clone();
            tokio::spawn(async move { carts.add("B1", add(1)).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }
        assert_eq!(carts.get("B1").await.unwrap().items[0].quantity, 10);
    }
}
