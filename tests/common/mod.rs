//! 集成测试共用的图片、multipart 请求体与变换桩。
#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgb32FImage};
use portrait_stylizer::config::ServiceConfig;
use portrait_stylizer::service::{StylizeTransform, TransformFault, TransformService};

pub const BOUNDARY: &str = "stylizer-test-boundary";

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 13) as u8, 128u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, format)
        .expect("encode test image");
    cursor.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Jpeg)
}

/// 单字段 multipart 请求体。
pub fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    let disposition =
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n");
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// 不带 `filename` 参数的普通表单字段。
pub fn multipart_form_value(field: &str, value: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    let disposition = format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n");
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(value);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn service_in(dir: &Path, transform: Arc<dyn StylizeTransform>) -> Arc<TransformService> {
    let config = ServiceConfig {
        staging_dir: dir.to_path_buf(),
        ..ServiceConfig::default()
    };
    Arc::new(TransformService::new(config, transform))
}

/// 原样解码输入。
pub struct Identity;

impl StylizeTransform for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn stylize(&self, input: &Path) -> Result<DynamicImage, TransformFault> {
        Ok(image::open(input)?)
    }
}

/// 产出 PNG 无法表示的 32 位浮点图。
pub struct FloatOutput;

impl StylizeTransform for FloatOutput {
    fn name(&self) -> &str {
        "float-output"
    }

    fn stylize(&self, _input: &Path) -> Result<DynamicImage, TransformFault> {
        Ok(DynamicImage::ImageRgb32F(Rgb32FImage::new(4, 4)))
    }
}

/// 总是失败的模型。
pub struct Failing;

impl StylizeTransform for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn stylize(&self, _input: &Path) -> Result<DynamicImage, TransformFault> {
        Err(TransformFault::External("model weights missing".to_string()))
    }
}

/// 记录同时执行的变换数量峰值。
pub struct ConcurrencyProbe {
    active: AtomicUsize,
    peak: AtomicUsize,
    saw_staged_input: AtomicUsize,
    delay: Duration,
}

impl Default for ConcurrencyProbe {
    fn default() -> Self {
        Self::with_delay(Duration::from_millis(30))
    }
}

impl ConcurrencyProbe {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            saw_staged_input: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn staged_inputs_seen(&self) -> usize {
        self.saw_staged_input.load(Ordering::SeqCst)
    }
}

impl StylizeTransform for ConcurrencyProbe {
    fn name(&self) -> &str {
        "probe"
    }

    fn stylize(&self, input: &Path) -> Result<DynamicImage, TransformFault> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if input.exists() {
            self.saw_staged_input.fetch_add(1, Ordering::SeqCst);
        }

        std::thread::sleep(self.delay);
        let decoded = image::open(input);

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(decoded?)
    }
}

/// 暂存目录中剩余的文件数。
pub fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
