use market_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env()?;

    // 3. 日志
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Market server starting..."
    );

    // 4. 启动 HTTP 服务器 (状态在 run 中初始化)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
