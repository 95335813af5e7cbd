//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `TransformService` 只负责单次请求的流程编排，不直接与 HTTP 绑定。
//! 处理链路固定为：
//! 1. 校验上传字节（失败即 `BadInput`，不落盘）
//! 2. 写入暂存文件
//! 3. 调用风格化变换
//! 4. 编码为 PNG
//! 5. 删除暂存文件（所有出口均执行）
//!
//! ## 实现思路
//!
//! - 暂存路径每个实例固定，`staging_lock` 把“落盘→变换→清理”包成互斥区，
//!   并发请求排队执行，不会互相覆盖暂存文件。
//! - 锁守卫（`OwnedMutexGuard`）与暂存守卫都移交给阻塞任务，
//!   调用方超时或断开只会丢弃等待，互斥区直到变换真正结束才释放。
//! - 变换与编码放进 `spawn_blocking`，模型 panic 以 `JoinError` 形式回收为 `Transform` 错误。
//! - 记录 `stage/transform/encode/total` 阶段耗时，便于性能诊断。

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::config::ServiceConfig;

use super::staging::StagingArtifact;
use super::transform::StylizeTransform;
use super::{StylizeError, encode, validation};

/// 风格化服务。
pub struct TransformService {
    config: ServiceConfig,
    transform: Arc<dyn StylizeTransform>,
    staging_lock: Arc<Mutex<()>>,
}

struct StageTimings {
    transform_ms: u128,
    encode_ms: u128,
}

impl TransformService {
    pub fn new(config: ServiceConfig, transform: Arc<dyn StylizeTransform>) -> Self {
        Self {
            config,
            transform,
            staging_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// 本实例的暂存路径（扩展名随上传格式变化，文件名固定）。
    pub fn staging_path(&self, extension: &str) -> PathBuf {
        self.config
            .staging_dir
            .join(format!("{}.{}", self.config.staging_stem, extension))
    }

    /// 处理主入口：上传字节 → PNG 字节。
    ///
    /// 返回前暂存文件一定已被删除，无论成功、变换失败还是编码失败。
    pub async fn handle(&self, image_bytes: &[u8]) -> Result<Vec<u8>, StylizeError> {
        let upload = validation::inspect_upload(image_bytes, &self.config)?;

        let exclusive = Arc::clone(&self.staging_lock).lock_owned().await;
        let total_start = Instant::now();

        let stage_start = Instant::now();
        let staging_path = self.staging_path(upload.extension);
        let staging = StagingArtifact::create(staging_path, image_bytes).await?;
        let stage_elapsed = stage_start.elapsed();

        // 锁与暂存文件随阻塞任务一起释放：请求被中途放弃时，后台变换仍独占暂存路径。
        let transform = Arc::clone(&self.transform);
        let joined = tokio::task::spawn_blocking(move || {
            let _exclusive = exclusive;
            let staging = staging;

            let outcome = stylize_and_encode(transform.as_ref(), staging.path());
            staging.cleanup();
            outcome
        })
        .await;

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_error) if join_error.is_panic() => Err(StylizeError::Transform(format!(
                "风格化模型异常终止：{}",
                panic_message(join_error.into_panic())
            ))),
            Err(join_error) => Err(StylizeError::Transform(format!(
                "风格化任务被取消：{}",
                join_error
            ))),
        };

        match outcome {
            Ok((png, timings)) => {
                log::info!(
                    "✅ 风格化完成 - 模型: {} 输入: {}x{} {} 输出: {}KB \
                     stage={}ms transform={}ms encode={}ms total={}ms",
                    self.transform.name(),
                    upload.width,
                    upload.height,
                    upload.mime_type,
                    png.len() / 1024,
                    stage_elapsed.as_millis(),
                    timings.transform_ms,
                    timings.encode_ms,
                    total_start.elapsed().as_millis()
                );
                Ok(png)
            }
            Err(err) => {
                log::warn!(
                    "❌ 风格化失败 - 模型: {} code={} stage={} 错误: {}",
                    self.transform.name(),
                    err.code(),
                    err.stage(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn stylize_and_encode(
    transform: &dyn StylizeTransform,
    input_path: &Path,
) -> Result<(Vec<u8>, StageTimings), StylizeError> {
    let transform_start = Instant::now();
    let stylized = transform
        .stylize(input_path)
        .map_err(|fault| StylizeError::Transform(fault.to_string()))?;
    let transform_ms = transform_start.elapsed().as_millis();

    let encode_start = Instant::now();
    let png = encode::encode_png(&stylized)?;
    let encode_ms = encode_start.elapsed().as_millis();

    Ok((png, StageTimings { transform_ms, encode_ms }))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}
