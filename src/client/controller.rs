//! # 客户端状态控制器
//!
//! ## 设计思路
//!
//! 会话状态只有两项：当前选中的输入图片、最近一次成功的处理结果。
//! 两者只能通过 `SessionController` 的方法修改，界面事件处理函数不直接写字段。
//!
//! 界面的三个入口（选图、发起处理、结果到达）分别对应
//! `select`、`request_processing`、`poll`/`on_result`。
//!
//! ## 实现思路
//!
//! - 同一时刻最多一个在途调度；在途期间 `request_processing` 返回 `Busy`，
//!   界面应据 `can_request_processing()` 禁用按钮。
//! - 终止事件通过 `PendingDispatch` 在界面线程上取回，再统一交给 `on_result`。
//! - 失败消息区分两种来源：HTTP 层（有状态码）与传输层（状态码为 0）。
//! - `select` 不清除上一次结果；`save` 永远写出当前 `last_result` 的字节。

use std::fmt;
use std::path::{Path, PathBuf};

use super::dispatcher::{Dispatch, DispatchEvent, PendingDispatch, RequestDispatcher};
use super::{ClientError, InputImage};
use crate::config::ClientConfig;

/// 失败来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// 服务返回了非 200 状态码。
    Http(u16),
    /// 请求没有到达服务（连接拒绝、DNS、超时等）。
    Transport,
}

/// 一次处理失败，`message` 面向用户。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingFailure {
    pub origin: FailureOrigin,
    pub message: String,
}

impl fmt::Display for ProcessingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 会话状态控制器。
pub struct SessionController<D: Dispatch = RequestDispatcher> {
    dispatcher: D,
    endpoint: String,
    input_reference: Option<InputImage>,
    last_result: Option<Vec<u8>>,
    last_failure: Option<ProcessingFailure>,
    status_message: Option<String>,
    in_flight: Option<PendingDispatch>,
}

impl SessionController<RequestDispatcher> {
    /// 按客户端配置创建控制器（含真实 HTTP 调度器）。
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let dispatcher = RequestDispatcher::new(config)?;
        Ok(Self::new(dispatcher, config.process_endpoint()))
    }
}

impl<D: Dispatch> SessionController<D> {
    pub fn new(dispatcher: D, endpoint: impl Into<String>) -> Self {
        Self {
            dispatcher,
            endpoint: endpoint.into(),
            input_reference: None,
            last_result: None,
            last_failure: None,
            status_message: None,
            in_flight: None,
        }
    }

    /// 记录新的输入图片。之前的处理结果保留，直到被新的成功结果覆盖。
    pub fn select(&mut self, path: impl Into<PathBuf>) -> Result<(), ClientError> {
        let input = InputImage::from_path(path)?;
        self.status_message = Some(format!("图片已上传: {}", input.path().display()));
        log::info!("🖼️ 已选择输入图片 - 路径: {}", input.path().display());
        self.input_reference = Some(input);
        Ok(())
    }

    /// 删除当前选择，同时重置派生的界面状态（状态栏、失败提示）。
    pub fn clear_selection(&mut self) -> Result<(), ClientError> {
        if self.input_reference.take().is_none() {
            return Err(ClientError::NoSelection);
        }
        self.last_failure = None;
        self.status_message = Some("已删除上传的图片".to_string());
        Ok(())
    }

    /// 把当前选中的图片投递给调度器。文件在调度器的工作线程上读取，
    /// 读取失败与网络失败一样经由 `on_result` 汇报。
    pub fn request_processing(&mut self) -> Result<(), ClientError> {
        let input = self.input_reference.as_ref().ok_or(ClientError::NoSelection)?;
        if self.in_flight.is_some() {
            return Err(ClientError::Busy);
        }

        log::info!("⏳ 发起处理 - 文件: {}", input.path().display());

        self.in_flight = Some(self.dispatcher.dispatch(input, &self.endpoint));
        self.last_failure = None;
        self.status_message = Some("正在处理图片，请稍候...".to_string());
        Ok(())
    }

    /// 唯一的完成处理入口。`status == 0` 表示请求未到达服务，此时 `error` 给出原因。
    pub fn on_result(
        &mut self,
        status: u16,
        body: Vec<u8>,
        error: &str,
    ) -> Result<(), ProcessingFailure> {
        if status == 200 {
            log::info!("✅ 处理完成 - 结果大小: {}B", body.len());
            self.last_result = Some(body);
            self.last_failure = None;
            self.status_message = Some("处理完成".to_string());
            return Ok(());
        }

        let failure = if status != 0 {
            let message = match server_error_message(&body) {
                Some(detail) => format!("处理图片失败，状态码: {}（{}）", status, detail),
                None => format!("处理图片失败，状态码: {}", status),
            };
            ProcessingFailure {
                origin: FailureOrigin::Http(status),
                message,
            }
        } else {
            let reason = if error.trim().is_empty() { "无法连接服务" } else { error };
            ProcessingFailure {
                origin: FailureOrigin::Transport,
                message: format!("发生异常：{}", reason),
            }
        };

        log::warn!("❌ {}", failure.message);
        self.status_message = Some(failure.message.clone());
        self.last_failure = Some(failure.clone());
        Err(failure)
    }

    /// 非阻塞地检查在途调度；有终止事件时交给 `on_result` 并返回其结果。
    pub fn poll(&mut self) -> Option<Result<(), ProcessingFailure>> {
        let event = self.in_flight.as_mut()?.try_take()?;
        self.in_flight = None;
        Some(self.apply_event(event))
    }

    /// 阻塞直到在途调度结束。没有在途调度时返回 `None`。
    ///
    /// 内部使用 `blocking_recv`，不能在异步运行时内部调用，否则会 panic。
    pub fn wait_for_completion(&mut self) -> Option<Result<(), ProcessingFailure>> {
        let pending = self.in_flight.take()?;
        let event = pending.wait();
        Some(self.apply_event(event))
    }

    fn apply_event(&mut self, event: DispatchEvent) -> Result<(), ProcessingFailure> {
        let (status, body, error) = event.into_parts();
        self.on_result(status, body, &error)
    }

    /// 原样写出最近一次成功结果。
    pub fn save(&self, destination: impl AsRef<Path>) -> Result<(), ClientError> {
        let bytes = self.last_result.as_ref().ok_or(ClientError::NoResult)?;
        std::fs::write(destination.as_ref(), bytes)?;
        log::info!("💾 图片已成功保存 - 路径: {}", destination.as_ref().display());
        Ok(())
    }

    /// 界面据此启用/禁用“开始处理”。
    pub fn can_request_processing(&self) -> bool {
        self.input_reference.is_some() && self.in_flight.is_none()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn input_reference(&self) -> Option<&InputImage> {
        self.input_reference.as_ref()
    }

    pub fn last_result(&self) -> Option<&[u8]> {
        self.last_result.as_deref()
    }

    pub fn last_failure(&self) -> Option<&ProcessingFailure> {
        self.last_failure.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }
}

/// 提取服务端 `{"error": "..."}` 中的消息。
fn server_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}
