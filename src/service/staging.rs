//! # 暂存文件模块
//!
//! ## 设计思路
//!
//! 上传的图片需要先落盘，外部风格化模型只接受文件路径。
//! `StagingArtifact` 采用 RAII 模式持有该文件：
//! 正常路径调用 `cleanup()`，提前返回或 panic 时由 `Drop` 兜底删除。
//!
//! ## 实现思路
//!
//! - 先构造守卫再写入，写入中途失败也能删除半成品。
//! - 删除时文件已不存在（`NotFound`）视为成功。
//! - 其他删除错误只记录日志，不影响请求结果。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::StylizeError;

/// 单次请求的暂存文件守卫。
#[derive(Debug)]
pub struct StagingArtifact {
    path: PathBuf,
    removed: bool,
}

impl StagingArtifact {
    /// 将请求字节写入暂存路径。
    pub async fn create(path: PathBuf, bytes: &[u8]) -> Result<Self, StylizeError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StylizeError::Io(format!("创建暂存目录 '{}' 失败：{}", parent.display(), e))
            })?;
        }

        let artifact = Self::reserve(path);
        tokio::fs::write(&artifact.path, bytes).await.map_err(|e| {
            StylizeError::Io(format!("写入暂存文件 '{}' 失败：{}", artifact.path.display(), e))
        })?;

        log::debug!("📥 已写入暂存文件 - 路径: {} 大小: {}B", artifact.path.display(), bytes.len());
        Ok(artifact)
    }

    /// 登记一个由他人创建的路径（例如外部模型的输出文件），同样在离开作用域时删除。
    pub fn reserve(path: PathBuf) -> Self {
        Self { path, removed: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 显式删除暂存文件。
    pub fn cleanup(mut self) {
        remove_quietly(&self.path);
        self.removed = true;
    }
}

impl Drop for StagingArtifact {
    fn drop(&mut self) {
        if !self.removed {
            remove_quietly(&self.path);
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("🧹 已删除暂存文件 - 路径: {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => log::warn!("⚠️ 删除暂存文件失败 - 路径: {} 错误: {}", path.display(), err),
    }
}
