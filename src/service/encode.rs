//! PNG 编码。
//!
//! 模型输出的通道布局不做假设（灰度、RGB、RGBA、16 位均可），
//! 直接交给 PNG 编码器；编码器不支持的布局（如 32 位浮点）报告为 `Encode` 错误。

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};

use super::StylizeError;

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, StylizeError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(image.as_bytes(), image.width(), image.height(), image.color().into())
        .map_err(|e| StylizeError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb, Rgb32FImage};

    #[test]
    fn encodes_grayscale_and_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 4, Luma([120])));
        let png = encode_png(&gray).expect("gray encodes");
        let decoded = image::load_from_memory(&png).expect("decodes");
        assert_eq!((decoded.width(), decoded.height()), (5, 4));

        let rgb = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(3, 2, Rgb([1, 2, 3])));
        let png = encode_png(&rgb).expect("rgb encodes");
        assert_eq!(infer::get(&png).map(|k| k.mime_type()), Some("image/png"));
    }

    #[test]
    fn float_layout_is_an_encode_error() {
        let float = DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(2, 2, Rgb([0.5, 0.5, 0.5])));
        assert!(matches!(encode_png(&float), Err(StylizeError::Encode(_))));
    }
}
