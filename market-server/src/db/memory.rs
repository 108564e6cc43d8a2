//! In-memory store
//!
//! DashMap-backed implementation of [`MarketStore`]. Used by tests and by
//! development runs without `DATABASE_URL`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::models::{
    Cart, Notification, Order, OrderItem, OrderQuery, Product, RatingSummary, Review, User,
};
use std::sync::atomic::{AtomicBool, Ordering};

use super::store::{
    MarketStore, OrderFilter, OrderItemFilter, StatusChange, StoreError, StoreResult,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// email -> user id
    emails: DashMap<String, String>,
    products: DashMap<String, Product>,
    carts: DashMap<String, Cart>,
    orders: DashMap<String, Order>,
    reviews: DashMap<String, Review>,
    /// (product id, buyer id) -> review id
    review_pairs: DashMap<(String, String), String>,
    /// recipient id -> notifications, oldest first
    notifications: DashMap<String, Vec<Notification>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable` until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    fn rating_of(&self, product_id: &str) -> RatingSummary {
        RatingSummary::from_ratings(
            self.reviews
                .iter()
                .filter(|r| r.product_id == product_id)
                .map(|r| r.rating),
        )
    }

    /// Run `write` while holding the product entry, then refresh its rating.
    /// `write` must not keep a `reviews` guard alive past its return.
    fn with_product<T>(
        &self,
        product_id: &str,
        write: impl FnOnce() -> StoreResult<T>,
    ) -> StoreResult<(T, RatingSummary)> {
        let mut product = self
            .products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::not_found("product", product_id))?;
        let out = write()?;
        let summary = self.rating_of(product_id);
        product.rating = summary.rating;
        product.review_count = summary.review_count;
        Ok((out, summary))
    }

    fn review_product(&self, id: &str) -> StoreResult<String> {
        self.reviews
            .get(id)
            .map(|r| r.product_id.clone())
            .ok_or_else(|| StoreError::not_found("review", id))
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        self.check_online()?;
        match self.emails.entry(email_key(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check_online()?;
        let Some(id) = self.emails.get(&email_key(email)).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        self.check_online()?;
        match self.products.entry(product.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "product exists: {}",
                product.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(product.clone());
                Ok(())
            }
        }
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.check_online()?;
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn get_cart(&self, buyer_id: &str) -> StoreResult<Cart> {
        self.check_online()?;
        Ok(self
            .carts
            .get(buyer_id)
            .map(|c| c.clone())
            .unwrap_or_else(|| Cart::empty(buyer_id)))
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.check_online()?;
        self.carts.insert(cart.buyer_id.clone(), cart.clone());
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> StoreResult<()> {
        self.check_online()?;
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!("order exists: {}", order.id)));
            }
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
            }
        }
        self.carts
            .insert(order.buyer_id.clone(), Cart::empty(order.buyer_id.clone()));
        Ok(())
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        self.check_online()?;
        Ok(self.orders.get(id).map(|o| o.clone()))
    }

    async fn update_order_status(&self, id: &str, change: &StatusChange) -> StoreResult<Order> {
        self.check_online()?;
        // The shard write lock makes the compare and the set one step
        let mut order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("order", id))?;
        if order.status != change.expected {
            return Err(StoreError::Stale {
                entity: "order",
                id: id.to_string(),
            });
        }
        order.status = change.next;
        order.updated_at = change.event.at;
        if change.tracking_number.is_some() {
            order.tracking_number = change.tracking_number.clone();
        }
        if change.carrier.is_some() {
            order.carrier = change.carrier.clone();
        }
        order.tracking_history.push(change.event.clone());
        Ok(order.clone())
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        query: &OrderQuery,
    ) -> StoreResult<(Vec<Order>, u64)> {
        self.check_online()?;
        let mut matched: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| match filter {
                OrderFilter::Buyer(buyer_id) => &o.buyer_id == buyer_id,
                OrderFilter::Seller(seller_id) => o.has_seller(seller_id),
                OrderFilter::All => true,
            })
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .map(|o| o.clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_order_items(&self, filter: &OrderItemFilter) -> StoreResult<Vec<OrderItem>> {
        self.check_online()?;
        let mut items = Vec::new();
        for order in self.orders.iter() {
            items.extend(
                order
                    .items
                    .iter()
                    .filter(|item| filter.matches(&order, item))
                    .cloned(),
            );
        }
        Ok(items)
    }

    async fn find_review(&self, product_id: &str, buyer_id: &str) -> StoreResult<Option<Review>> {
        self.check_online()?;
        let key = (product_id.to_string(), buyer_id.to_string());
        let Some(id) = self.review_pairs.get(&key).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn get_review(&self, id: &str) -> StoreResult<Option<Review>> {
        self.check_online()?;
        Ok(self.reviews.get(id).map(|r| r.clone()))
    }

    async fn create_review(&self, review: &Review) -> StoreResult<RatingSummary> {
        self.check_online()?;
        let ((), summary) = self.with_product(&review.product_id, || {
            let key = (review.product_id.clone(), review.buyer_id.clone());
            match self.review_pairs.entry(key) {
                Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                    "review exists for product {} by buyer {}",
                    review.product_id, review.buyer_id
                ))),
                Entry::Vacant(slot) => {
                    self.reviews.insert(review.id.clone(), review.clone());
                    slot.insert(review.id.clone());
                    Ok(())
                }
            }
        })?;
        Ok(summary)
    }

    async fn update_review(&self, review: &Review) -> StoreResult<RatingSummary> {
        self.check_online()?;
        let product_id = self.review_product(&review.id)?;
        let ((), summary) = self.with_product(&product_id, || {
            let mut stored = self
                .reviews
                .get_mut(&review.id)
                .ok_or_else(|| StoreError::not_found("review", &review.id))?;
            stored.rating = review.rating;
            stored.comment = review.comment.clone();
            stored.updated_at = review.updated_at;
            Ok(())
        })?;
        Ok(summary)
    }

    async fn delete_review(&self, id: &str) -> StoreResult<(Review, RatingSummary)> {
        self.check_online()?;
        let product_id = self.review_product(id)?;
        self.with_product(&product_id, || {
            let (_, review) = self
                .reviews
                .remove(id)
                .ok_or_else(|| StoreError::not_found("review", id))?;
            self.review_pairs
                .remove(&(review.product_id.clone(), review.buyer_id.clone()));
            Ok(review)
        })
    }

    async fn list_reviews(&self, product_id: &str) -> StoreResult<Vec<Review>> {
        self.check_online()?;
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.clone())
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.check_online()?;
        self.notifications
            .entry(notification.recipient_id.clone())
            .or_default()
            .push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, recipient_id: &str) -> StoreResult<Vec<Notification>> {
        self.check_online()?;
        let mut list = self
            .notifications
            .get(recipient_id)
            .map(|n| n.clone())
            .unwrap_or_default();
        list.reverse();
        Ok(list)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }
}
