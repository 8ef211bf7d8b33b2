//! 以最高质量把像素缓冲序列化为受支持的格式。

use std::io::Cursor;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

use super::{CodecError, EncodedImage, ImageMime};

/// JPEG 质量参数上限，对应浏览器画布导出时的 1.0。
const MAX_JPEG_QUALITY: u8 = 100;

/// 编码像素缓冲。
///
/// - JPEG：质量 100，丢弃 alpha
/// - PNG：无损
/// - WebP：无损（质量参数对无损模式不适用）
pub fn encode(image: &DynamicImage, mime: ImageMime) -> Result<EncodedImage, CodecError> {
    let mut cursor = Cursor::new(Vec::new());

    let result = match mime {
        ImageMime::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, MAX_JPEG_QUALITY))
        }
        ImageMime::Png => image.write_with_encoder(PngEncoder::new(&mut cursor)),
        ImageMime::Webp => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut cursor))
        }
    };
    result.map_err(|e| CodecError::EncodeFailed(format!("{} 编码失败：{}", mime, e)))?;

    let bytes = cursor.into_inner();
    if bytes.is_empty() {
        return Err(CodecError::EncodeFailed(format!("{} 编码结果为空", mime)));
    }

    log::debug!(
        "🗜️ 编码完成 - 格式: {} 尺寸: {}x{} 体积: {} bytes",
        mime,
        image.width(),
        image.height(),
        bytes.len()
    );

    Ok(EncodedImage::new(bytes, mime))
}
