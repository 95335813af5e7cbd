//! # 输入图片引用
//!
//! 界面的三种选图方式（菜单打开、拖拽、文件对话框）最终都产生一个本地路径。
//! `InputImage` 只记录路径并按扩展名过滤，字节由调度器在工作线程上读取。

use std::path::{Path, PathBuf};

use super::ClientError;

/// 可接受的输入扩展名。
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 当前选中的输入图片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    path: PathBuf,
}

impl InputImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ClientError::UnsupportedFile(path.display().to_string()));
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// multipart 上传时使用的文件名。
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}
