//! # 输入校验模块
//!
//! 在落盘之前尽早拒绝无效上传：空内容、非图片签名、无法读取图片头、像素超限。
//! 这些情况统一归为 `BadInput`，不会创建暂存文件。

use std::io::Cursor;

use crate::config::ServiceConfig;

use super::StylizeError;

/// 校验通过的上传图片概要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedUpload {
    /// 按文件签名推断的扩展名（`png`、`jpg` 等），用于暂存文件命名。
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// 校验上传字节。
pub fn inspect_upload(
    bytes: &[u8],
    config: &ServiceConfig,
) -> Result<InspectedUpload, StylizeError> {
    if bytes.is_empty() {
        return Err(StylizeError::BadInput("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| StylizeError::BadInput("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(StylizeError::BadInput(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    let (width, height) = inspect_dimensions(bytes)?;
    validate_pixel_limits(config, width, height)?;

    Ok(InspectedUpload {
        extension: kind.extension(),
        mime_type: kind.mime_type(),
        width,
        height,
    })
}

/// 仅读取图片头中的宽高，不做完整解码。
fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), StylizeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StylizeError::BadInput(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| StylizeError::BadInput(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(
    config: &ServiceConfig,
    width: u32,
    height: u32,
) -> Result<(), StylizeError> {
    if width == 0 || height == 0 {
        return Err(StylizeError::BadInput(format!("图片尺寸无效：{}x{}", width, height)));
    }

    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| StylizeError::BadInput("图片像素数溢出".to_string()))?;

    if pixels > config.max_input_pixels {
        return Err(StylizeError::BadInput(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_input_pixels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 90])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, format)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn accepts_png_and_jpeg() {
        let config = ServiceConfig::default();

        let png = inspect_upload(&encode(32, 16, ImageFormat::Png), &config).expect("png accepted");
        assert_eq!(png.extension, "png");
        assert_eq!((png.width, png.height), (32, 16));

        let jpg =
            inspect_upload(&encode(20, 10, ImageFormat::Jpeg), &config).expect("jpeg accepted");
        assert_eq!(jpg.extension, "jpg");
        assert_eq!(jpg.mime_type, "image/jpeg");
    }

    #[test]
    fn rejects_empty_payload() {
        let result = inspect_upload(&[], &ServiceConfig::default());
        assert!(matches!(result, Err(StylizeError::BadInput(_))));
    }

    #[test]
    fn rejects_non_image_signature() {
        let result = inspect_upload(b"%PDF-1.7 not a picture", &ServiceConfig::default());
        assert!(matches!(result, Err(StylizeError::BadInput(_))));

        let result = inspect_upload(b"<html><body>hello</body></html>", &ServiceConfig::default());
        assert!(matches!(result, Err(StylizeError::BadInput(_))));
    }

    #[test]
    fn rejects_truncated_image_header() {
        let png = encode(8, 8, ImageFormat::Png);
        let result = inspect_upload(&png[..10], &ServiceConfig::default());
        assert!(matches!(result, Err(StylizeError::BadInput(_))));
    }

    #[test]
    fn rejects_too_many_pixels() {
        let mut config = ServiceConfig::default();
        config.max_input_pixels = 100;

        let result = inspect_upload(&encode(20, 20, ImageFormat::Png), &config);
        assert!(matches!(result, Err(StylizeError::BadInput(_))));
    }
}
