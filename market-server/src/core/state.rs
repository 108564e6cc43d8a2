//! ServerState

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::{AggregateLocks, MarketStore, MemoryStore, PgStore};
use crate::orders::{InventoryReleaser, LoggingInventory, OrdersManager, StoreNotifier};
use crate::reviews::ReviewService;
use crate::services::{AccountService, CartService, CatalogService, CheckoutService};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 克隆成本低 (全部是 Arc)。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置 (不可变) |
/// | store | 存储后端 (内存或 PostgreSQL) |
/// | locks | 按聚合 (订单/商品/购物车) 串行化写入 |
/// | jwt_service | 令牌签发与解析 |
/// | orders | 订单状态机的唯一写入者 |
/// | reviews | 评价与评分重算 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn MarketStore>,
    pub locks: Arc<AggregateLocks>,
    pub jwt_service: Arc<JwtService>,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrdersManager,
    pub reviews: ReviewService,
}

impl ServerState {
    /// Wire services around an existing store
    pub fn new(
        config: Config,
        store: Arc<dyn MarketStore>,
        inventory: Arc<dyn InventoryReleaser>,
    ) -> Self {
        let locks = Arc::new(AggregateLocks::new());
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Self {
            accounts: AccountService::new(store.clone(), jwt_service.clone()),
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone(), locks.clone()),
            checkout: CheckoutService::new(store.clone(), locks.clone()),
            orders: OrdersManager::new(
                store.clone(),
                locks.clone(),
                inventory,
                Arc::new(StoreNotifier::new(store.clone())),
            ),
            reviews: ReviewService::new(store.clone(), locks.clone()),
            config,
            store,
            locks,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 存储: `DATABASE_URL` 存在时连接 PostgreSQL 并执行迁移，否则使用内存存储
    /// 2. 各服务
    /// 3. 可选的管理员账号
    pub async fn initialize(config: &Config) -> Result<Self> {
        let store: Arc<dyn MarketStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections).await?;
                tracing::info!("Connected to PostgreSQL");
                Arc::new(store)
            }
            None => {
                if config.is_production() {
                    return Err(ServerError::Config(
                        "DATABASE_URL must be set in production".into(),
                    ));
                }
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let state = Self::new(config.clone(), store, Arc::new(LoggingInventory));

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            state
                .accounts
                .ensure_admin(email, password)
                .await
                .map_err(|e| ServerError::Config(format!("admin bootstrap failed: {e}")))?;
        }

        Ok(state)
    }

    /// In-memory state for tests
    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), Arc::new(LoggingInventory))
    }

    /// 启动后台任务
    ///
    /// - 每 5 分钟清理空闲的聚合锁
    pub fn start_background_tasks(&self) {
        let locks = self.locks.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                let before = locks.len();
                locks.prune();
                tracing::debug!(before, after = locks.len(), "Pruned aggregate locks");
            }
        });
    }
}
