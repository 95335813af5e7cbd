//! # 客户端模块（client）
//!
//! ## 设计思路
//!
//! 客户端只做三件事：记住用户选中的图片、把它投递给风格化服务、保存服务返回的结果。
//!
//! - `source`：输入图片引用与扩展名过滤
//! - `dispatcher`：后台运行时上的 HTTP 调度，结果经 `oneshot` 交回
//! - `controller`：会话状态机，界面或命令行只和它打交道
//! - `error`：前置条件提示与初始化错误
//!
//! ## 调用链
//!
//! ```text
//! select(path) ─→ InputImage
//! request_processing() ─→ Dispatch::dispatch ─→ PendingDispatch
//! poll() / wait_for_completion() ─→ on_result(status, body, error)
//! save(dest) ─→ 原样写出 last_result
//! ```

pub mod controller;
pub mod dispatcher;
mod error;
mod source;

pub use controller::{FailureOrigin, ProcessingFailure, SessionController};
pub use dispatcher::{Dispatch, DispatchEvent, PendingDispatch, RequestDispatcher};
pub use error::ClientError;
pub use source::{InputImage, SUPPORTED_EXTENSIONS};
