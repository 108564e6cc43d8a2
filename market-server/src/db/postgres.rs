//! PostgreSQL store (sqlx)
//!
//! Order status writes are compare-and-set (`UPDATE ... WHERE status = $expected`),
//! reviews carry a `UNIQUE (product_id, buyer_id)` constraint, and every review
//! write recomputes the product rating in the same transaction while holding
//! the product row lock (`SELECT ... FOR UPDATE`). Several server processes may
//! share one database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, Notification, NotificationKind, Order, OrderItem, OrderQuery, OrderStatus,
    Product, RatingSummary, Review, Role, ShippingAddress, TrackingEvent, User,
};
use sqlx::{PgConnection, PgPool};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::time::Duration;

use super::store::{
    MarketStore, OrderFilter, OrderItemFilter, StatusChange, StoreError, StoreResult,
};

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
                StoreError::Serialization(e.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StoreError::Backend(format!("migration failed: {e}"))
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("PostgreSQL store ready");

        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_orders(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        let items: Vec<OrderItemRow> =
            sqlx::query_as("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;
        let events: Vec<TrackingRow> = sqlx::query_as(
            "SELECT * FROM order_tracking WHERE order_id = ANY($1) ORDER BY seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in items {
            items_by_order
                .entry(row.order_id.clone())
                .or_default()
                .push(row.into_model());
        }
        let mut events_by_order: HashMap<String, Vec<TrackingEvent>> = HashMap::new();
        for row in events {
            let order_id = row.order_id.clone();
            events_by_order
                .entry(order_id)
                .or_default()
                .push(row.into_model()?);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                let history = events_by_order.remove(&row.id).unwrap_or_default();
                row.into_model(items, history)
            })
            .collect()
    }
}

// ========== Row types ==========

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    buyer_id: Option<String>,
    seller_id: Option<String>,
    created_at: i64,
}

impl UserRow {
    fn into_model(self) -> StoreResult<User> {
        Ok(User {
            role: self.role.parse::<Role>().map_err(StoreError::Serialization)?,
            id: self.id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    seller_id: String,
    name: String,
    description: String,
    price: Decimal,
    rating: f64,
    review_count: i32,
    created_at: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            seller_id: row.seller_id,
            name: row.name,
            description: row.description,
            price: row.price,
            rating: row.rating,
            review_count: u32::try_from(row.review_count).unwrap_or(0),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    buyer_id: String,
    status: String,
    total_amount: Decimal,
    currency: String,
    shipping_address: String,
    tracking_number: Option<String>,
    carrier: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn into_model(self, items: Vec<OrderItem>, history: Vec<TrackingEvent>) -> StoreResult<Order> {
        let shipping_address: ShippingAddress = serde_json::from_str(&self.shipping_address)?;
        Ok(Order {
            status: parse_status(&self.status)?,
            id: self.id,
            buyer_id: self.buyer_id,
            items,
            total_amount: self.total_amount,
            currency: self.currency,
            shipping_address,
            tracking_number: self.tracking_number,
            carrier: self.carrier,
            tracking_history: history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    seller_id: String,
    quantity: i32,
    price: Decimal,
}

impl OrderItemRow {
    fn into_model(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            seller_id: self.seller_id,
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            price: self.price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    order_id: String,
    status: String,
    note: Option<String>,
    location: Option<String>,
    actor_role: String,
    at: i64,
}

impl TrackingRow {
    fn into_model(self) -> StoreResult<TrackingEvent> {
        Ok(TrackingEvent {
            status: parse_status(&self.status)?,
            note: self.note,
            location: self.location,
            actor_role: self
                .actor_role
                .parse::<Role>()
                .map_err(StoreError::Serialization)?,
            at: self.at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    product_id: String,
    buyer_id: String,
    rating: i16,
    comment: String,
    created_at: i64,
    updated_at: i64,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            product_id: row.product_id,
            buyer_id: row.buyer_id,
            rating: u8::try_from(row.rating).unwrap_or(0),
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: String,
    recipient_id: String,
    kind: String,
    message: String,
    order_id: Option<String>,
    created_at: i64,
}

impl NotificationRow {
    fn into_model(self) -> StoreResult<Notification> {
        Ok(Notification {
            kind: self
                .kind
                .parse::<NotificationKind>()
                .map_err(StoreError::Serialization)?,
            id: self.id,
            recipient_id: self.recipient_id,
            message: self.message,
            order_id: self.order_id,
            created_at: self.created_at,
        })
    }
}

fn parse_status(s: &str) -> StoreResult<OrderStatus> {
    s.parse::<OrderStatus>().map_err(StoreError::Serialization)
}

fn to_i32(quantity: u32) -> StoreResult<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::Serialization(format!("quantity out of range: {quantity}")))
}

// ========== Rating aggregate ==========

/// Take the product row lock for the rest of the transaction
async fn lock_product(conn: &mut PgConnection, product_id: &str) -> StoreResult<()> {
    let locked: Option<(String,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    match locked {
        Some(_) => Ok(()),
        None => Err(StoreError::not_found("product", product_id)),
    }
}

/// Recompute rating and count from the reviews; caller holds the product lock
async fn refresh_rating(conn: &mut PgConnection, product_id: &str) -> StoreResult<RatingSummary> {
    let ratings: Vec<(i16,)> = sqlx::query_as("SELECT rating FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;
    let summary = RatingSummary::from_ratings(
        ratings
            .into_iter()
            .map(|(rating,)| u8::try_from(rating).unwrap_or(0)),
    );

    sqlx::query("UPDATE products SET rating = $1, review_count = $2 WHERE id = $3")
        .bind(summary.rating)
        .bind(i32::try_from(summary.review_count).unwrap_or(i32::MAX))
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(summary)
}

impl PgStore {
    async fn review_product(&self, review_id: &str) -> StoreResult<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT product_id FROM reviews WHERE id = $1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(product_id,)| product_id)
            .ok_or_else(|| StoreError::not_found("review", review_id))
    }
}

// ========== MarketStore ==========

#[async_trait]
impl MarketStore for PgStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, buyer_id, seller_id, created_at)
             VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.buyer_id)
        .bind(&user.seller_id)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = lower($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_model).transpose()
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_model).transpose()
    }

    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, seller_id, name, description, price, rating, review_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&product.id)
        .bind(&product.seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.rating)
        .bind(i32::try_from(product.review_count).unwrap_or(i32::MAX))
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn get_cart(&self, buyer_id: &str) -> StoreResult<Cart> {
        let rows: Vec<(String, String, i32)> = sqlx::query_as(
            "SELECT id, product_id, quantity FROM cart_items WHERE buyer_id = $1 ORDER BY seq",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Cart {
            buyer_id: buyer_id.to_string(),
            items: rows
                .into_iter()
                .map(|(id, product_id, quantity)| CartItem {
                    id,
                    product_id,
                    quantity: u32::try_from(quantity).unwrap_or(0),
                })
                .collect(),
        })
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
            .bind(&cart.buyer_id)
            .execute(&mut *tx)
            .await?;
        for item in &cart.items {
            sqlx::query(
                "INSERT INTO cart_items (id, buyer_id, product_id, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(&item.id)
            .bind(&cart.buyer_id)
            .bind(&item.product_id)
            .bind(to_i32(item.quantity)?)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> StoreResult<()> {
        let shipping_address = serde_json::to_string(&order.shipping_address)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, buyer_id, status, total_amount, currency, shipping_address,
                                 tracking_number, carrier, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&order.id)
        .bind(&order.buyer_id)
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(shipping_address)
        .bind(&order.tracking_number)
        .bind(&order.carrier)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, seller_id, quantity, price)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&item.id)
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(&item.seller_id)
            .bind(to_i32(item.quantity)?)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        for event in &order.tracking_history {
            sqlx::query(
                "INSERT INTO order_tracking (order_id, status, note, location, actor_role, at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&order.id)
            .bind(event.status.as_str())
            .bind(&event.note)
            .bind(&event.location)
            .bind(event.actor_role.as_str())
            .bind(event.at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
            .bind(&order.buyer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.load_orders(vec![row]).await?.pop())
    }

    async fn update_order_status(&self, id: &str, change: &StatusChange) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders
             SET status = $1, updated_at = $2,
                 tracking_number = COALESCE($3, tracking_number),
                 carrier = COALESCE($4, carrier)
             WHERE id = $5 AND status = $6",
        )
        .bind(change.next.as_str())
        .bind(change.event.at)
        .bind(&change.tracking_number)
        .bind(&change.carrier)
        .bind(id)
        .bind(change.expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => StoreError::Stale {
                    entity: "order",
                    id: id.to_string(),
                },
                None => StoreError::not_found("order", id),
            });
        }

        sqlx::query(
            "INSERT INTO order_tracking (order_id, status, note, location, actor_role, at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(change.event.status.as_str())
        .bind(&change.event.note)
        .bind(&change.event.location)
        .bind(change.event.actor_role.as_str())
        .bind(change.event.at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        query: &OrderQuery,
    ) -> StoreResult<(Vec<Order>, u64)> {
        let (buyer_id, seller_id) = match filter {
            OrderFilter::Buyer(id) => (Some(id.as_str()), None),
            OrderFilter::Seller(id) => (None, Some(id.as_str())),
            OrderFilter::All => (None, None),
        };
        let status = query.status.map(|s| s.as_str());

        const WHERE: &str = "WHERE ($1::text IS NULL OR o.buyer_id = $1)
              AND ($2::text IS NULL OR EXISTS (
                    SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.seller_id = $2))
              AND ($3::text IS NULL OR o.status = $3)";

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM orders o {WHERE}"))
            .bind(buyer_id)
            .bind(seller_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT o.* FROM orders o {WHERE}
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(buyer_id)
        .bind(seller_id)
        .bind(status)
        .bind(i64::from(query.limit()))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let orders = self.load_orders(rows).await?;
        Ok((orders, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_order_items(&self, filter: &OrderItemFilter) -> StoreResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT i.* FROM order_items i JOIN orders o ON o.id = i.order_id
             WHERE ($1::text IS NULL OR o.buyer_id = $1)
               AND ($2::text IS NULL OR i.product_id = $2)
               AND ($3::text IS NULL OR i.seller_id = $3)
               AND ($4::text IS NULL OR o.status = $4)",
        )
        .bind(&filter.buyer_id)
        .bind(&filter.product_id)
        .bind(&filter.seller_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderItemRow::into_model).collect())
    }

    async fn find_review(&self, product_id: &str, buyer_id: &str) -> StoreResult<Option<Review>> {
        let row: Option<ReviewRow> =
            sqlx::query_as("SELECT * FROM reviews WHERE product_id = $1 AND buyer_id = $2")
                .bind(product_id)
                .bind(buyer_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Review::from))
    }

    async fn get_review(&self, id: &str) -> StoreResult<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Review::from))
    }

    async fn create_review(&self, review: &Review) -> StoreResult<RatingSummary> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut *tx, &review.product_id).await?;

        sqlx::query(
            "INSERT INTO reviews (id, product_id, buyer_id, rating, comment, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&review.id)
        .bind(&review.product_id)
        .bind(&review.buyer_id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&mut *tx)
        .await?;

        let summary = refresh_rating(&mut *tx, &review.product_id).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn update_review(&self, review: &Review) -> StoreResult<RatingSummary> {
        let product_id = self.review_product(&review.id).await?;
        let mut tx = self.pool.begin().await?;
        lock_product(&mut *tx, &product_id).await?;

        let result = sqlx::query(
            "UPDATE reviews SET rating = $1, comment = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.updated_at)
        .bind(&review.id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("review", &review.id));
        }

        let summary = refresh_rating(&mut *tx, &product_id).await?;
        tx.commit().await?;
        Ok(summary)
    }

    async fn delete_review(&self, id: &str) -> StoreResult<(Review, RatingSummary)> {
        let product_id = self.review_product(id).await?;
        let mut tx = self.pool.begin().await?;
        lock_product(&mut *tx, &product_id).await?;

        let removed: Option<ReviewRow> =
            sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(removed) = removed else {
            return Err(StoreError::not_found("review", id));
        };

        let summary = refresh_rating(&mut *tx, &product_id).await?;
        tx.commit().await?;
        Ok((removed.into(), summary))
    }

    async fn list_reviews(&self, product_id: &str) -> StoreResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, kind, message, order_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&notification.id)
        .bind(&notification.recipient_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(&notification.order_id)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(&self, recipient_id: &str) -> StoreResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY seq DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(NotificationRow::into_model).collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
