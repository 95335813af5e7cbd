//! # 人像风格化服务 — 服务端入口
//!
//! 本文件仅负责日志、配置与服务实例的初始化。
//! 处理链路分布在 `service` 与 `server` 模块中，详见 `lib.rs` 架构文档。

use std::process::ExitCode;
use std::sync::Arc;

use portrait_stylizer::config::StylizerConfig;
use portrait_stylizer::error::AppError;
use portrait_stylizer::server;
use portrait_stylizer::service::{StylizeTransform, TransformService, build_transform};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("服务启动失败: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = StylizerConfig::load()?;
    let addr = config.server.bind_socket_addr()?;
    log::info!("setup: config loaded, staging_dir={}", config.server.staging_dir.display());

    let transform = build_transform(&config.server);
    log::info!("setup: transform ready, model={}", transform.name());

    let service = Arc::new(TransformService::new(config.server, transform));
    server::run_server(addr, service).await
}
