//! # 风格化服务模块（service）
//!
//! ## 设计思路
//!
//! 将“校验 → 暂存 → 风格化 → 编码 → 清理”按职责拆分为多个子模块：
//!
//! - `handler`：`TransformService`，编排整条链路并持有暂存互斥锁
//! - `validation`：落盘前的签名/尺寸校验
//! - `staging`：暂存文件的 RAII 守卫
//! - `transform`：风格化模型接缝与内置实现
//! - `encode`：PNG 编码
//! - `error`：统一错误与失败分类
//!
//! ## 调用链
//!
//! ```text
//! HTTP POST /process（server 模块）
//!    ↓
//! handler.rs（TransformService::handle）
//!    ├─ validation.rs（空内容 / 非图片 / 像素超限 → BadInput）
//!    ├─ staging.rs（写入固定暂存路径，离开作用域即删除）
//!    ├─ transform.rs（spawn_blocking 中执行模型）
//!    └─ encode.rs（任意通道布局 → PNG）
//!    ↓
//! Result<Vec<u8>, StylizeError>
//! ```

mod encode;
mod error;
mod handler;
pub mod staging;
pub mod transform;
pub mod validation;

pub use encode::encode_png;
pub use error::{FailureKind, StylizeError};
pub use handler::TransformService;
pub use staging::StagingArtifact;
pub use transform::{
    CartoonTransform, ExternalCommandTransform, StylizeTransform, TransformFault, build_transform,
};
