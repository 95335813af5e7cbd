//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 服务端单次请求的所有失败来源统一收敛到 `StylizeError`，
//! 任何故障都不会以 panic 或裸 I/O 错误的形式逃逸出请求处理。
//! 通过 `kind()` 给出稳定的分类，HTTP 层据此决定状态码。

/// 失败分类。
///
/// - `BadInput`：请求缺少文件、内容为空或无法识别为图片（400）
/// - `TransformError`：风格化模型执行失败（500）
/// - `EncodeError`：模型输出无法编码为 PNG（500）
/// - `Io`：暂存文件写入等服务端 I/O 故障（500）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadInput,
    TransformError,
    EncodeError,
    Io,
}

/// 风格化请求统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum StylizeError {
    #[error("{0}")]
    BadInput(String),

    #[error("风格化处理失败：{0}")]
    Transform(String),

    #[error("图像编码失败：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    Io(String),
}

impl StylizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::BadInput(_) => FailureKind::BadInput,
            Self::Transform(_) => FailureKind::TransformError,
            Self::Encode(_) => FailureKind::EncodeError,
            Self::Io(_) => FailureKind::Io,
        }
    }

    /// 稳定错误码，用于日志检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "E_BAD_INPUT",
            Self::Transform(_) => "E_TRANSFORM",
            Self::Encode(_) => "E_ENCODE",
            Self::Io(_) => "E_IO",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "validate",
            Self::Transform(_) => "transform",
            Self::Encode(_) => "encode",
            Self::Io(_) => "stage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(StylizeError::BadInput("x".into()).kind(), FailureKind::BadInput);
        assert_eq!(StylizeError::Transform("x".into()).kind(), FailureKind::TransformError);
        assert_eq!(StylizeError::Encode("x".into()).kind(), FailureKind::EncodeError);
        assert_eq!(StylizeError::Io("x".into()).kind(), FailureKind::Io);
    }

    #[test]
    fn transform_message_is_surfaced() {
        let err = StylizeError::Transform("model exploded".into());
        assert!(err.to_string().contains("model exploded"));
        assert_eq!(err.code(), "E_TRANSFORM");
        assert_eq!(err.stage(), "transform");
    }
}
