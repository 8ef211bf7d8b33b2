//! # 解码后的位图与缩放因子
//!
//! `RasterImage` 同时记录两套尺寸：
//! - natural：原图像素尺寸，解码后不再变化
//! - displayed：裁剪界面上的渲染尺寸，随布局与缩放变化
//!
//! 两者之比即 `ScaleFactor`，裁剪时用它把界面坐标映射回原图像素。

use image::DynamicImage;

use super::ImageMime;

/// 界面坐标 → 原图像素坐标的缩放因子。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

/// 裁剪会话期间持有的已解码位图。
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    natural_width: u32,
    natural_height: u32,
    displayed_width: f64,
    displayed_height: f64,
    declared_mime: ImageMime,
}

impl RasterImage {
    /// 包装解码结果，初始显示尺寸等于原图尺寸。
    pub fn new(pixels: DynamicImage, declared_mime: ImageMime) -> Self {
        let natural_width = pixels.width();
        let natural_height = pixels.height();
        Self {
            pixels,
            natural_width,
            natural_height,
            displayed_width: natural_width as f64,
            displayed_height: natural_height as f64,
            declared_mime,
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn natural_width(&self) -> u32 {
        self.natural_width
    }

    pub fn natural_height(&self) -> u32 {
        self.natural_height
    }

    pub fn displayed_width(&self) -> f64 {
        self.displayed_width
    }

    pub fn displayed_height(&self) -> f64 {
        self.displayed_height
    }

    /// 上传时声明的类型；裁剪输出默认沿用它。
    pub fn declared_mime(&self) -> ImageMime {
        self.declared_mime
    }

    /// 布局或缩放改变后更新显示尺寸。
    pub fn set_displayed_size(&mut self, width: f64, height: f64) {
        self.displayed_width = width;
        self.displayed_height = height;
    }

    /// 显示尺寸非正或非有限时返回 `None`。
    pub fn scale_factor(&self) -> Option<ScaleFactor> {
        let usable = |value: f64| value.is_finite() && value > 0.0;
        if !usable(self.displayed_width) || !usable(self.displayed_height) {
            return None;
        }

        Some(ScaleFactor {
            x: self.natural_width as f64 / self.displayed_width,
            y: self.natural_height as f64 / self.displayed_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn blank(width: u32, height: u32) -> RasterImage {
        RasterImage::new(
            DynamicImage::ImageRgba8(RgbaImage::new(width, height)),
            ImageMime::Png,
        )
    }

    #[test]
    fn scale_factor_tracks_displayed_size() {
        let mut raster = blank(1000, 500);
        assert_eq!(raster.scale_factor(), Some(ScaleFactor { x: 1.0, y: 1.0 }));

        raster.set_displayed_size(500.0, 250.0);
        assert_eq!(raster.scale_factor(), Some(ScaleFactor { x: 2.0, y: 2.0 }));
    }

    #[test]
    fn zero_display_has_no_scale_factor() {
        let mut raster = blank(10, 10);
        raster.set_displayed_size(0.0, 10.0);
        assert!(raster.scale_factor().is_none());
    }
}
