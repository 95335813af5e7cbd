//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各层保留自己的错误枚举（`ClientError`、`ConfigError`），
//! 二进制入口只面对 `AppError`，通过 `#[from]` 自动上转，无需手动 map。
//! 服务端的 `StylizeError` 只在请求内部流转，由 HTTP 层直接转换为响应，不进入 `AppError`。

use crate::client::ClientError;
use crate::config::ConfigError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置加载或校验失败
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// 客户端操作失败
    #[error("{0}")]
    Client(#[from] ClientError),

    /// 文件系统或网络 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP 服务运行失败
    #[error("服务运行失败: {0}")]
    Server(String),

    /// 服务处理失败（HTTP 非 200 或请求未到达服务）
    #[error("{0}")]
    Processing(String),

    /// 命令行参数错误
    #[error("参数错误: {0}")]
    Usage(String),
}
