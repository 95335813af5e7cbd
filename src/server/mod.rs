//! # HTTP 接口模块（server）
//!
//! ## 设计思路
//!
//! 单一业务接口 `/process`：
//! - `GET` 返回使用说明（不是错误）
//! - `POST` multipart，字段名 `file`，成功返回 `image/png` 原始字节
//!
//! 所有失败统一为 `{"error": "<message>"}` JSON：输入问题 400，服务端问题 500。
//! 另提供 `/health` 存活检查。

mod middleware;
mod response;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::error::AppError;
use crate::service::TransformService;

pub use response::status_for;
pub use routes::{FILE_FIELD, PROCESS_INSTRUCTIONS};

pub fn build_router(service: Arc<TransformService>) -> Router {
    let body_limit = service.config().max_upload_bytes;

    Router::new()
        .route("/process", get(routes::handle_process_get).post(routes::handle_process))
        .route("/health", get(routes::handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .with_state(service)
}

/// 绑定地址并持续服务，收到 Ctrl+C 后优雅退出。
pub async fn run_server(addr: SocketAddr, service: Arc<TransformService>) -> Result<(), AppError> {
    log::info!("🚀 绑定风格化服务 addr={}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, service).await
}

/// 在已绑定的监听器上服务（测试可绑定 `127.0.0.1:0`）。
pub async fn serve(listener: TcpListener, service: Arc<TransformService>) -> Result<(), AppError> {
    let addr = listener.local_addr()?;
    let app = build_router(service);
    log::info!("✅ 风格化服务已就绪 addr={}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            log::error!("服务意外终止 addr={} error={}", addr, err);
            AppError::Server(err.to_string())
        })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("监听 Ctrl+C 失败，服务将持续运行：{}", err);
        std::future::pending::<()>().await;
    }
    log::info!("👋 收到退出信号，停止接收新请求");
}
