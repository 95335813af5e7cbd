//! # 风格化变换模块
//!
//! ## 设计思路
//!
//! 风格化模型对服务而言是黑盒：输入一个图片文件路径，输出任意通道布局的栅格图，
//! 或者失败。`StylizeTransform` 是这道接缝，服务只依赖该 trait。
//!
//! 提供两种实现：
//! - `CartoonTransform`：内置的卡通化效果（降采样 + 色阶量化 + 描边），无需外部模型即可运行
//! - `ExternalCommandTransform`：调用外部程序（通常是模型推理脚本），读取其输出文件
//!
//! ## 实现思路
//!
//! 变换在阻塞线程中执行（见 `handler`），因此这里全部使用同步 API。

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::config::{CartoonConfig, ExternalCommandConfig, ServiceConfig};

use super::staging::StagingArtifact;

/// 变换失败原因。
#[derive(Debug, thiserror::Error)]
pub enum TransformFault {
    #[error("图片解码失败：{0}")]
    Decode(#[from] image::ImageError),

    #[error("文件错误：{0}")]
    Io(#[from] std::io::Error),

    #[error("外部模型执行失败：{0}")]
    External(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

/// 风格化变换接缝。
pub trait StylizeTransform: Send + Sync {
    /// 用于日志的名称。
    fn name(&self) -> &str;

    fn stylize(&self, input: &Path) -> Result<DynamicImage, TransformFault>;
}

/// 按配置构建变换：配置了外部命令则使用外部模型，否则使用内置效果。
pub fn build_transform(config: &ServiceConfig) -> Arc<dyn StylizeTransform> {
    match &config.external {
        Some(external) => Arc::new(ExternalCommandTransform::new(external.clone())),
        None => Arc::new(CartoonTransform::new(config.cartoon.clone())),
    }
}

// ============================================================================
// 内置卡通化效果
// ============================================================================

pub struct CartoonTransform {
    config: CartoonConfig,
}

impl CartoonTransform {
    pub fn new(config: CartoonConfig) -> Self {
        Self { config }
    }

    fn maybe_downscale(&self, image: DynamicImage) -> Result<DynamicImage, TransformFault> {
        let (width, height) = image.dimensions();
        let max_dim = self.config.max_dimension;
        if width <= max_dim && height <= max_dim {
            return Ok(image);
        }

        let (target_width, target_height) = if width >= height {
            let scaled = (height as u64 * max_dim as u64 / width as u64).max(1);
            (max_dim, scaled as u32)
        } else {
            let scaled = (width as u64 * max_dim as u64 / height as u64).max(1);
            (scaled as u32, max_dim)
        };

        log::info!(
            "🧩 风格化前降采样：{}x{} -> {}x{}",
            width,
            height,
            target_width,
            target_height
        );

        match resize_with_fast_image_resize(&image, target_width, target_height) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                Ok(image.resize_exact(
                    target_width,
                    target_height,
                    image::imageops::FilterType::Triangle,
                ))
            }
        }
    }
}

impl StylizeTransform for CartoonTransform {
    fn name(&self) -> &str {
        "cartoon"
    }

    fn stylize(&self, input: &Path) -> Result<DynamicImage, TransformFault> {
        let decoded = image::open(input)?;
        let prepared = self.maybe_downscale(decoded)?;
        let rgba = prepared.to_rgba8();
        let posterized = posterize(&rgba, self.config.levels);
        let outlined = darken_edges(&rgba, posterized, self.config.edge_threshold);
        Ok(DynamicImage::ImageRgba8(outlined))
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage, TransformFault> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| TransformFault::ResourceLimit(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| TransformFault::ResourceLimit(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| {
            TransformFault::ResourceLimit("fast_image_resize 输出缓冲长度异常".to_string())
        })?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

/// 每个颜色通道量化到 `levels` 个色阶，alpha 保持不变。
fn posterize(source: &RgbaImage, levels: u8) -> RgbaImage {
    let steps = levels.max(2) as u32 - 1;
    let quantize = |v: u8| -> u8 {
        let bucket = (v as u32 * steps + 127) / 255;
        (bucket * 255 / steps) as u8
    };

    let mut out = source.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [quantize(r), quantize(g), quantize(b), a];
    }
    out
}

fn luma(pixel: &Rgba<u8>) -> i32 {
    let [r, g, b, _] = pixel.0;
    (r as i32 * 299 + g as i32 * 587 + b as i32 * 114) / 1000
}

/// 以原图亮度梯度为依据，把梯度超过阈值的像素压暗成描边。
fn darken_edges(source: &RgbaImage, mut target: RgbaImage, threshold: u8) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width < 2 || height < 2 {
        return target;
    }

    for y in 0..height {
        for x in 0..width {
            let center = luma(source.get_pixel(x, y));
            let right = luma(source.get_pixel((x + 1).min(width - 1), y));
            let down = luma(source.get_pixel(x, (y + 1).min(height - 1)));
            let gradient = (right - center).abs() + (down - center).abs();

            if gradient > threshold as i32 {
                let pixel = target.get_pixel_mut(x, y);
                let [r, g, b, a] = pixel.0;
                pixel.0 = [r / 4, g / 4, b / 4, a];
            }
        }
    }
    target
}

// ============================================================================
// 外部模型命令
// ============================================================================

/// 调用外部程序：`program args... <input> <output>`，输出固定为 PNG 文件。
pub struct ExternalCommandTransform {
    config: ExternalCommandConfig,
}

impl ExternalCommandTransform {
    pub fn new(config: ExternalCommandConfig) -> Self {
        Self { config }
    }
}

impl StylizeTransform for ExternalCommandTransform {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn stylize(&self, input: &Path) -> Result<DynamicImage, TransformFault> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "staging".to_string());
        let output = StagingArtifact::reserve(input.with_file_name(format!("{}_output.png", stem)));

        log::info!("🤖 调用外部模型 - 程序: {} 输入: {}", self.config.program, input.display());

        let result = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(input)
            .arg(output.path())
            .output()
            .map_err(|e| {
                TransformFault::External(format!("无法启动 '{}'：{}", self.config.program, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let detail = stderr.trim();
            return Err(TransformFault::External(if detail.is_empty() {
                format!("进程退出状态 {}", result.status)
            } else {
                format!("进程退出状态 {}：{}", result.status, detail)
            }));
        }

        let stylized = image::open(output.path())?;
        output.cleanup();
        Ok(stylized)
    }
}
