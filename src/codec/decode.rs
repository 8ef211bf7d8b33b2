//! # 上传校验与解码
//!
//! ## 设计思路
//!
//! 先做“零成本”的快速拒绝，再做昂贵的完整解码：
//! 声明类型与体积不合规时直接失败，不会触碰任何解码器，也不存在部分解码。
//!
//! ## 实现思路
//!
//! 1. 校验声明的 MIME 是否在支持集合内
//! 2. 校验原始字节体积
//! 3. 读取 header 尺寸并按像素/内存上限拒绝
//! 4. 按内容字节完整解码（声明类型只用于输出编码，不参与格式判断）
//! 5. 声明类型与嗅探结果不一致时仅记录告警

use std::io::Cursor;
use std::time::Instant;

use image::ImageReader;

use super::{CodecConfig, CodecError, ImageMime, RasterImage};

/// 校验并解码上传的图片字节。
pub fn decode(
    bytes: &[u8],
    declared_mime: &str,
    config: &CodecConfig,
) -> Result<RasterImage, CodecError> {
    let declared = ImageMime::from_mime_str(declared_mime)?;
    check_upload_size(bytes.len() as u64, config)?;

    let start = Instant::now();
    log_declared_mismatch(bytes, declared);

    let (header_width, header_height) = inspect_dimensions(bytes)?;
    config.check_pixel_limits(header_width, header_height)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| CodecError::Decode(format!("图片解码失败：{}", e)))?;
    config.check_pixel_limits(decoded.width(), decoded.height())?;

    log::info!(
        "✅ 图片解码成功 - 声明类型: {} 尺寸: {}x{} 体积: {} bytes 耗时: {}ms",
        declared,
        decoded.width(),
        decoded.height(),
        bytes.len(),
        start.elapsed().as_millis()
    );

    Ok(RasterImage::new(decoded, declared))
}

/// 体积校验，单独暴露给只需校验不需解码的调用方（如风格参考图）。
pub fn check_upload_size(size: u64, config: &CodecConfig) -> Result<(), CodecError> {
    if size > config.max_file_size {
        return Err(CodecError::FileTooLarge {
            size,
            limit: config.max_file_size,
        });
    }
    Ok(())
}

/// 仅通过图片头信息读取宽高，用于完整解码前的像素限制检查。
fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| CodecError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn log_declared_mismatch(bytes: &[u8], declared: ImageMime) {
    let Some(kind) = infer::get(bytes) else {
        log::debug!("🔍 无法嗅探图片类型，按内容交给解码器处理");
        return;
    };

    if kind.mime_type() != declared.as_str() {
        log::warn!(
            "⚠️ 声明类型与内容不一致 - 声明: {} 实际: {}，按实际内容解码",
            declared,
            kind.mime_type()
        );
    }
}
