//! # 请求调度模块
//!
//! ## 设计思路
//!
//! 文件读取和网络调用都不能占用界面线程。`RequestDispatcher` 自带一个单工作线程的 tokio 运行时，
//! `dispatch` 只负责把请求投递过去并立即返回 `PendingDispatch`。
//!
//! 每次调度恰好产生一个终止事件（`Completed` 或 `Failed`），
//! 通过 `oneshot` 通道交回持有界面状态的线程：
//! - 收到任意 HTTP 响应（含非 2xx）→ `Completed { status, body }`
//! - 读取输入文件失败、连接失败、DNS、读取响应体失败 → `Failed { reason }`
//! - 请求任务 panic 或运行时关闭 → `Failed { reason }`
//!
//! 不重试、不取消、不设整体超时（仅有连接超时）。

use std::error::Error as _;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tokio::runtime::Runtime;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::config::ClientConfig;
use crate::server::FILE_FIELD;

use super::{ClientError, InputImage};

/// 调度终止事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// 服务有响应（状态码可能不是 200）。
    Completed { status: u16, body: Vec<u8> },
    /// 请求没有拿到完整响应。
    Failed { reason: String },
}

impl DispatchEvent {
    /// 拆成 `(status, body, error)`，`status == 0` 表示未到达服务。
    pub fn into_parts(self) -> (u16, Vec<u8>, String) {
        match self {
            Self::Completed { status, body } => (status, body, String::new()),
            Self::Failed { reason } => (0, Vec::new(), reason),
        }
    }
}

/// 尚未取走终止事件的调度。
#[derive(Debug)]
pub struct PendingDispatch {
    receiver: Option<oneshot::Receiver<DispatchEvent>>,
}

impl PendingDispatch {
    /// 包装一个由调度方持有发送端的通道。
    pub fn from_receiver(receiver: oneshot::Receiver<DispatchEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// 已经有结果的调度。
    pub fn ready(event: DispatchEvent) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(event);
        Self::from_receiver(receiver)
    }

    /// 非阻塞取事件：尚未完成返回 `None`；事件只会被取走一次。
    pub fn try_take(&mut self) -> Option<DispatchEvent> {
        let receiver = self.receiver.as_mut()?;
        let event = match receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => worker_lost(),
        };
        self.receiver = None;
        Some(event)
    }

    /// 阻塞等待事件。不能在异步运行时内部调用。
    pub fn wait(mut self) -> DispatchEvent {
        match self.receiver.take() {
            Some(receiver) => receiver.blocking_recv().unwrap_or_else(|_| worker_lost()),
            None => worker_lost(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }
}

fn worker_lost() -> DispatchEvent {
    DispatchEvent::Failed {
        reason: "请求任务意外终止".to_string(),
    }
}

/// 调度接缝：控制器只依赖该 trait。
///
/// 输入文件的读取也属于调度的一部分，读取失败同样以 `Failed` 终止事件交回。
pub trait Dispatch {
    fn dispatch(&self, input: &InputImage, endpoint: &str) -> PendingDispatch;
}

/// 基于 reqwest 的调度器。
pub struct RequestDispatcher {
    runtime: Option<Runtime>,
    client: reqwest::Client,
}

impl RequestDispatcher {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("stylize-dispatch")
            .enable_all()
            .build()
            .map_err(|e| ClientError::Dispatcher(format!("创建运行时失败：{}", e)))?;

        let client = {
            let _context = runtime.enter();
            reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .build()
                .map_err(|e| ClientError::Dispatcher(format!("创建 HTTP 客户端失败：{}", e)))?
        };

        Ok(Self {
            runtime: Some(runtime),
            client,
        })
    }
}

impl Dispatch for RequestDispatcher {
    fn dispatch(&self, input: &InputImage, endpoint: &str) -> PendingDispatch {
        let Some(runtime) = self.runtime.as_ref() else {
            return PendingDispatch::ready(DispatchEvent::Failed {
                reason: "请求调度器已关闭".to_string(),
            });
        };

        let (sender, receiver) = oneshot::channel();
        let client = self.client.clone();
        let endpoint = endpoint.to_string();
        let path = input.path().to_path_buf();
        let file_name = input.file_name();

        let request = runtime.spawn(async move {
            match tokio::fs::read(&path).await {
                Ok(image) => send_image(&client, &endpoint, image, file_name).await,
                Err(err) => {
                    log::warn!("⚠️ 读取输入图片失败 - 路径: {} 错误: {}", path.display(), err);
                    DispatchEvent::Failed {
                        reason: format!("读取图片失败：{}", err),
                    }
                }
            }
        });
        runtime.spawn(async move {
            let event = match request.await {
                Ok(event) => event,
                Err(join_error) => DispatchEvent::Failed {
                    reason: format!("请求任务异常终止：{}", join_error),
                },
            };
            if sender.send(event).is_err() {
                log::debug!("调度结果无人接收，已丢弃");
            }
        });

        PendingDispatch::from_receiver(receiver)
    }
}

impl Drop for RequestDispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn send_image(
    client: &reqwest::Client,
    endpoint: &str,
    image: Vec<u8>,
    file_name: String,
) -> DispatchEvent {
    let size = image.len();
    let mime = infer::get(&image)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    let part = match Part::bytes(image).file_name(file_name).mime_str(mime) {
        Ok(part) => part,
        Err(err) => {
            return DispatchEvent::Failed {
                reason: format!("构建上传内容失败：{}", err),
            };
        }
    };
    let form = Form::new().part(FILE_FIELD, part);

    log::info!("📡 发送图片 - 目标: {} 大小: {}B 类型: {}", endpoint, size, mime);

    let response = match client.post(endpoint).multipart(form).send().await {
        Ok(response) => response,
        Err(err) => {
            let reason = describe_transport_error(&err);
            log::warn!("⚠️ 请求未到达服务：{}", reason);
            return DispatchEvent::Failed { reason };
        }
    };

    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(body) => {
            log::info!("📬 收到响应 - 状态码: {} 大小: {}B", status, body.len());
            DispatchEvent::Completed {
                status,
                body: body.to_vec(),
            }
        }
        Err(err) => DispatchEvent::Failed {
            reason: format!(
                "读取响应失败（状态码 {}）：{}",
                status,
                describe_transport_error(&err)
            ),
        },
    }
}

/// 展开 reqwest 错误链，保留 “connection refused” 之类的底层原因。
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
