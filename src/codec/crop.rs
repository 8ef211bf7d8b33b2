//! # 裁剪并重新编码
//!
//! ## 实现思路
//!
//! 1. 百分比矩形先换算为显示像素
//! 2. 用 `natural / displayed` 缩放因子映射到原图像素空间
//! 3. 宽高向下取整（不四舍五入，避免越过原图边界），为 0 即失败
//! 4. 按像素 / 内存上限校验后分配输出画布，按最近邻直接拷贝区域像素（不做重采样滤波）
//! 5. 以最高质量编码为目标格式

use std::time::Instant;

use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::crop::CropRegion;

use super::{CodecConfig, CodecError, EncodedImage, ImageMime, RasterImage, encode};

/// 浮点误差容差：满幅裁剪映射回原图时可能得到 999.9999…，不能因此丢掉一整列。
const FLOOR_EPSILON: f64 = 1e-6;

/// 原图像素空间中的源矩形。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 把显示坐标系下的裁剪矩形映射到原图像素空间。
pub fn map_to_natural(image: &RasterImage, crop: &CropRegion) -> Result<SourceRect, CodecError> {
    let scale = image.scale_factor().ok_or_else(|| {
        CodecError::ContextUnavailable(format!(
            "显示尺寸无效：{}x{}",
            image.displayed_width(),
            image.displayed_height()
        ))
    })?;

    let px = crop.to_pixels(image.displayed_width(), image.displayed_height());

    Ok(SourceRect {
        x: px.x * scale.x,
        y: px.y * scale.y,
        width: px.width * scale.x,
        height: px.height * scale.y,
    })
}

/// 裁剪并编码为 `output`。输出画布同样受 `limits` 的像素与内存上限约束。
pub fn crop_and_encode(
    image: &RasterImage,
    crop: &CropRegion,
    output: ImageMime,
    limits: &CodecConfig,
) -> Result<EncodedImage, CodecError> {
    let start = Instant::now();
    let source = map_to_natural(image, crop)?;

    let out_width = floor_dimension(source.width);
    let out_height = floor_dimension(source.height);
    if out_width < 1.0 || out_height < 1.0 {
        return Err(CodecError::CropRegionEmpty {
            width: source.width,
            height: source.height,
        });
    }

    let canvas = blit_region(image.pixels(), &source, out_width, out_height, limits)?;
    let (width, height) = canvas.dimensions();
    let encoded = encode(&DynamicImage::ImageRgba8(canvas), output)?;

    log::info!(
        "✂️ 裁剪完成 - 源区域: ({:.1}, {:.1}, {:.1}x{:.1}) 输出: {}x{} {} 耗时: {}ms",
        source.x,
        source.y,
        source.width,
        source.height,
        width,
        height,
        output,
        start.elapsed().as_millis()
    );

    Ok(encoded)
}

/// NaN 视为 0。
fn floor_dimension(value: f64) -> f64 {
    if value.is_finite() {
        (value + FLOOR_EPSILON).floor().max(0.0)
    } else if value == f64::INFINITY {
        value
    } else {
        0.0
    }
}

/// 分配输出画布并按最近邻拷贝源区域；源区域外的像素保持透明。
fn blit_region(
    source: &DynamicImage,
    rect: &SourceRect,
    out_width: f64,
    out_height: f64,
    limits: &CodecConfig,
) -> Result<RgbaImage, CodecError> {
    if out_width > u32::MAX as f64 || out_height > u32::MAX as f64 {
        return Err(CodecError::ContextUnavailable(format!(
            "输出尺寸超出范围：{}x{}",
            out_width, out_height
        )));
    }
    let (width, height) = (out_width as u32, out_height as u32);
    limits
        .check_pixel_limits(width, height)
        .map_err(|e| CodecError::ContextUnavailable(format!("输出画布超出上限：{}", e)))?;

    let bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| {
            CodecError::ContextUnavailable(format!("输出画布过大：{}x{}", width, height))
        })?;

    let buffer = vec![0u8; bytes];
    let mut canvas = RgbaImage::from_raw(width, height, buffer)
        .ok_or_else(|| CodecError::ContextUnavailable("输出画布缓冲长度异常".to_string()))?;

    let (source_width, source_height) = source.dimensions();
    let step_x = rect.width / width as f64;
    let step_y = rect.height / height as f64;

    for out_y in 0..height {
        let src_y = (rect.y + (out_y as f64 + 0.5) * step_y).floor();
        if src_y < 0.0 || src_y >= source_height as f64 {
            continue;
        }
        for out_x in 0..width {
            let src_x = (rect.x + (out_x as f64 + 0.5) * step_x).floor();
            if src_x < 0.0 || src_x >= source_width as f64 {
                continue;
            }
            canvas.put_pixel(out_x, out_y, source.get_pixel(src_x as u32, src_y as u32));
        }
    }

    Ok(canvas)
}
