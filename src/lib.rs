//! # 人像风格化服务 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  客户端 (stylize-client)                  │
//! │                                                          │
//! │  SessionController ── InputImage ── last_result          │
//! │       │                                                  │
//! │  RequestDispatcher (独立 tokio 运行时 + reqwest)          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ HTTP multipart `file` → image/png | {"error": ...}
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            服务端 (stylize-server)                │
//! │                                                          │
//! │  ┌─ server ────── axum 路由 / 日志中间件 / 错误响应       │
//! │  │                                                       │
//! │  ├─ service ───── TransformService (暂存互斥锁)          │
//! │  │   ├─ validation   签名与尺寸校验                       │
//! │  │   ├─ staging      暂存文件 RAII 守卫                   │
//! │  │   ├─ transform    卡通化模型 / 外部命令                │
//! │  │   └─ encode       PNG 编码                             │
//! │  │                                                       │
//! │  ├─ config ────── JSON 配置 + 环境变量覆盖                │
//! │  └─ error ─────── AppError (统一错误类型)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，两个二进制入口的返回类型 |
//! | [`config`] | 服务端与客户端配置的加载、覆盖与校验 |
//! | [`service`] | 校验、暂存、风格化、编码、清理的完整处理链路 |
//! | [`server`] | `/process` 与 `/health` 接口、请求日志、错误到 HTTP 的映射 |
//! | [`client`] | 会话状态机、后台请求调度、结果保存 |

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
