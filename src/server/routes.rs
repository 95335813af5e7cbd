//! 路由处理函数：只做 multipart 解析与响应组装，业务全部交给 `TransformService`。

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::service::{StylizeError, TransformService};

/// 上传字段名。
pub const FILE_FIELD: &str = "file";

pub const PROCESS_INSTRUCTIONS: &str = "Please use POST method to upload an image.";

struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

pub async fn handle_process_get() -> &'static str {
    PROCESS_INSTRUCTIONS
}

pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn handle_process(
    State(service): State<Arc<TransformService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            log::warn!("🚫 请求不是合法的 multipart：{}", rejection.body_text());
            let message = format!("无法解析上传内容：{}", rejection.body_text());
            return StylizeError::BadInput(message).into_response();
        }
    };

    let upload = match read_file_field(&mut multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            log::warn!("🚫 上传被拒绝：{}", err);
            return err.into_response();
        }
    };

    log::info!("📤 收到上传 - 文件名: {} 大小: {}B", upload.file_name, upload.bytes.len());

    match service.handle(&upload.bytes).await {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(err) => err.into_response(),
    }
}

/// 找到名为 `file` 的文件字段；其他字段忽略。
///
/// 没有 `filename` 参数的同名字段是普通表单值，不算文件；
/// 带有空 `filename` 的字段表示用户没有选择文件。
async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, StylizeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StylizeError::BadInput(format!("无法解析上传内容：{}", e.body_text())))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name().map(|name| name.to_string()) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(StylizeError::BadInput("未选择文件".to_string()));
        }

        let bytes = field.bytes().await.map_err(|e| {
            StylizeError::BadInput(format!("读取上传文件失败：{}", e.body_text()))
        })?;

        return Ok(UploadedFile { file_name, bytes });
    }

    Err(StylizeError::BadInput("请求中未包含文件".to_string()))
}
