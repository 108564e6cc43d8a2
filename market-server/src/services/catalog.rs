//! Product catalogue

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{MAX_PRICE, PRICE_SCALE, Product, ProductCreate, is_valid_price};
use shared::util::{new_id, now_millis};
use std::sync::Arc;

use crate::db::MarketStore;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_required_text};

#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn MarketStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, seller_id: &str, input: ProductCreate) -> AppResult<Product> {
        validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
        if input.description.len() > MAX_NOTE_LEN {
            return Err(AppError::validation(format!(
                "description is too long (max {MAX_NOTE_LEN})"
            )));
        }
        if !is_valid_price(input.price) {
            return Err(AppError::new(ErrorCode::ProductInvalidPrice)
                .with_detail("price", input.price.to_string())
                .with_detail("max", MAX_PRICE.to_string())
                .with_detail("scale", PRICE_SCALE));
        }

        let product = Product {
            id: new_id(),
            seller_id: seller_id.to_string(),
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            price: input.price,
            rating: 0.0,
            review_count: 0,
            created_at: now_millis(),
        };
        self.store.create_product(&product).await?;
        tracing::info!(product_id = %product.id, seller_id = %seller_id, "Product created");
        Ok(product)
    }

    pub async fn get(&self, product_id: &str) -> AppResult<Product> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("productId", product_id)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal::Decimal;

    fn input(name: &str, price: Decimal) -> ProductCreate {
        ProductCreate {
            name: name.into(),
            description: String::new(),
            price,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let product = catalog
            .create("S1", input(" Desk lamp ", Decimal::new(2450, 2)))
            .await
            .unwrap();
        assert_eq!(product.name, "Desk lamp");
        assert_eq!(product.review_count, 0);

        let fetched = catalog.get(&product.id).await.unwrap();
        assert_eq!(fetched, product);

        let product = catalog.create("S1", input("Safe", MAX_PRICE)).await.unwrap();
        assert_eq!(product.price, MAX_PRICE);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let err = catalog.create("S1", input("Lamp", Decimal::ZERO)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        let err = catalog
            .create("S1", input("Lamp", MAX_PRICE + Decimal::ONE))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        assert_eq!(err.detail_str("max"), Some("9999999999.99"));
        let err = catalog
            .create("S1", input("Lamp", Decimal::new(19999, 3)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        let err = catalog.create("S1", input("  ", Decimal::ONE)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let err = catalog.get("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }
}
