use crate::auth::JwtConfig;
use crate::core::ServerError;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_URL | (unset) | PostgreSQL 连接串，未设置时使用内存存储 |
/// | DATABASE_MAX_CONNECTIONS | 10 | 连接池大小 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | (generated in development) | 至少 32 字符 |
/// | JWT_EXPIRATION_MINUTES | 10080 | 令牌有效期 |
/// | JWT_ISSUER / JWT_AUDIENCE | market-server / market-clients | |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (unset) | 日志目录，设置后按天滚动写文件 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | (unset) | 启动时创建管理员账号 |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// development | staging | production
    pub environment: String,
    pub jwt: JwtConfig,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ServerError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(environment == "development")
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            http_port: env_or("HTTP_PORT", 3000),
            database_url: env_opt("DATABASE_URL"),
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            environment,
            jwt,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            admin_email: env_opt("ADMIN_EMAIL"),
            admin_password: env_opt("ADMIN_PASSWORD"),
        })
    }

    /// In-memory configuration for tests
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            http_port: 0,
            database_url: None,
            database_max_connections: 1,
            environment: "test".into(),
            jwt: JwtConfig::with_secret(jwt_secret),
            log_level: "warn".into(),
            log_dir: None,
            request_timeout_ms: 5_000,
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
