//! 客户端错误。
//!
//! `NoSelection` / `NoResult` / `Busy` / `UnsupportedFile` 是前置条件提示，
//! 界面应以提示框呈现，而不是终止进程。

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("当前没有上传的图片，请先上传图片！")]
    NoSelection,

    #[error("没有处理后的图片可供保存！")]
    NoResult,

    #[error("图片正在处理中，请稍候...")]
    Busy,

    #[error("不支持的图片类型：{0}（可选：png / jpg / jpeg / bmp）")]
    UnsupportedFile(String),

    #[error("文件错误：{0}")]
    Io(#[from] std::io::Error),

    #[error("请求调度器初始化失败：{0}")]
    Dispatcher(String),
}

impl ClientError {
    /// 是否为应以提示（而非错误）呈现的前置条件问题。
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            Self::NoSelection | Self::NoResult | Self::Busy | Self::UnsupportedFile(_)
        )
    }
}
