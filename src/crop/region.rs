//! # 裁剪矩形与几何计算
//!
//! ## 设计思路
//!
//! 所有几何算法都是纯函数：输入显示尺寸与目标比例，输出唯一矩形，便于属性测试。
//! 矩形始终定义在“显示坐标系”中，单位（百分比 / 像素）随矩形一起携带。
//!
//! ## 已覆盖的边界场景
//! - 任一显示尺寸为零或非有限：不产生矩形
//! - 用户矩形越界：由 `constrain_to_surface` 收敛到边界内并锁定比例

use serde::{Deserialize, Serialize};

/// 初始裁剪框占显示范围的比例。
pub const INITIAL_EXTENT: f64 = 0.9;

/// 矩形坐标的单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropUnit {
    /// 相对显示尺寸的百分比（0–100）。
    Percent,
    /// 显示坐标系下的绝对像素。
    Pixels,
}

/// 显示坐标系下的裁剪矩形。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub unit: CropUnit,
}

impl CropRegion {
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Pixels,
        }
    }

    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Percent,
        }
    }

    /// 换算为显示像素单位。
    pub fn to_pixels(&self, displayed_width: f64, displayed_height: f64) -> Self {
        match self.unit {
            CropUnit::Pixels => *self,
            CropUnit::Percent => Self::pixels(
                self.x / 100.0 * displayed_width,
                self.y / 100.0 * displayed_height,
                self.width / 100.0 * displayed_width,
                self.height / 100.0 * displayed_height,
            ),
        }
    }

    /// 换算为百分比单位。
    pub fn to_percent(&self, displayed_width: f64, displayed_height: f64) -> Self {
        match self.unit {
            CropUnit::Percent => *self,
            CropUnit::Pixels => Self::percent(
                self.x / displayed_width * 100.0,
                self.y / displayed_height * 100.0,
                self.width / displayed_width * 100.0,
                self.height / displayed_height * 100.0,
            ),
        }
    }

    /// 显示像素下的宽高比。
    pub fn aspect(&self, displayed_width: f64, displayed_height: f64) -> f64 {
        let px = self.to_pixels(displayed_width, displayed_height);
        px.width / px.height
    }

    /// 所有分量有限，坐标非负，宽高为正。
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
    }

    /// 是否完全落在显示范围内（容差 `1e-6`）。
    pub fn fits_within(&self, displayed_width: f64, displayed_height: f64) -> bool {
        const EPS: f64 = 1e-6;
        let px = self.to_pixels(displayed_width, displayed_height);
        px.x >= -EPS
            && px.y >= -EPS
            && px.x + px.width <= displayed_width + EPS
            && px.y + px.height <= displayed_height + EPS
    }
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// 计算初始裁剪框：在显示范围的 90% 内放下最大的目标比例矩形，并居中。
///
/// 返回百分比单位，使其与后续缩放无关。
///
/// # 后置条件
/// - `width / height`（换算为像素后）等于 `aspect`
/// - 矩形完全位于 `[0, displayed_width] × [0, displayed_height]` 内
pub fn centered_aspect_crop(
    displayed_width: f64,
    displayed_height: f64,
    aspect: f64,
) -> Option<CropRegion> {
    if !usable(displayed_width) || !usable(displayed_height) || !usable(aspect) {
        return None;
    }

    let max_width = displayed_width * INITIAL_EXTENT;
    let max_height = displayed_height * INITIAL_EXTENT;

    // 先按宽度撑满，放不下再按高度撑满
    let (width, height) = if max_width / aspect <= max_height {
        (max_width, max_width / aspect)
    } else {
        (max_height * aspect, max_height)
    };

    let x = (displayed_width - width) / 2.0;
    let y = (displayed_height - height) / 2.0;

    Some(CropRegion::pixels(x, y, width, height).to_percent(displayed_width, displayed_height))
}

/// 裁剪交互面的职责：把用户拖拽结果锁定到目标比例并收敛到边界内。
///
/// 以矩形中心为锚点调整尺寸，超界时先缩小再平移。返回像素单位。
pub fn constrain_to_surface(
    rect: &CropRegion,
    aspect: f64,
    displayed_width: f64,
    displayed_height: f64,
) -> Option<CropRegion> {
    if !usable(displayed_width) || !usable(displayed_height) || !usable(aspect) {
        return None;
    }

    let px = rect.to_pixels(displayed_width, displayed_height);
    if !px.width.is_finite() || !px.height.is_finite() || px.width <= 0.0 || px.height <= 0.0 {
        return None;
    }

    let center_x = px.x + px.width / 2.0;
    let center_y = px.y + px.height / 2.0;

    // 以宽度为准锁定比例
    let mut width = px.width;
    let mut height = width / aspect;

    if width > displayed_width {
        width = displayed_width;
        height = width / aspect;
    }
    if height > displayed_height {
        height = displayed_height;
        width = height * aspect;
    }

    let x = (center_x - width / 2.0).clamp(0.0, displayed_width - width);
    let y = (center_y - height / 2.0).clamp(0.0, displayed_height - height);

    Some(CropRegion::pixels(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn landscape_crop_on_square_image_is_width_bound() {
        let region = centered_aspect_crop(1000.0, 1000.0, 16.0 / 9.0).expect("region");
        let px = region.to_pixels(1000.0, 1000.0);

        assert_eq!(region.unit, CropUnit::Percent);
        assert!(approx(px.width, 900.0));
        assert!(approx(px.height, 506.25));
        assert!(approx(px.x, 50.0));
        assert!(approx(px.y, 246.875));
    }

    #[test]
    fn portrait_crop_on_square_image_is_height_bound() {
        let region = centered_aspect_crop(1000.0, 1000.0, 0.75).expect("region");
        let px = region.to_pixels(1000.0, 1000.0);

        assert!(approx(px.height, 900.0));
        assert!(approx(px.width, 675.0));
        assert!(approx(px.x, 162.5));
        assert!(approx(px.y, 50.0));
    }

    #[test]
    fn zero_display_yields_no_region() {
        assert!(centered_aspect_crop(0.0, 100.0, 1.0).is_none());
        assert!(centered_aspect_crop(100.0, 100.0, 0.0).is_none());
        assert!(centered_aspect_crop(f64::NAN, 100.0, 1.0).is_none());
    }

    #[test]
    fn percent_and_pixels_convert_both_ways() {
        let px = CropRegion::pixels(10.0, 20.0, 100.0, 50.0);
        let pct = px.to_percent(200.0, 100.0);
        assert_eq!(pct.unit, CropUnit::Percent);
        assert!(approx(pct.x, 5.0) && approx(pct.y, 20.0));
        assert!(approx(pct.width, 50.0) && approx(pct.height, 50.0));

        let back = pct.to_pixels(200.0, 100.0);
        assert_eq!(back.unit, CropUnit::Pixels);
        assert!(approx(back.x, 10.0) && approx(back.width, 100.0));
    }

    #[test]
    fn constrain_locks_ratio_and_clamps_into_bounds() {
        let dragged = CropRegion::pixels(900.0, -50.0, 400.0, 100.0);
        let fixed = constrain_to_surface(&dragged, 1.0, 1000.0, 800.0).expect("constrained");

        assert!(approx(fixed.width, 400.0));
        assert!(approx(fixed.height, 400.0));
        assert!(fixed.fits_within(1000.0, 800.0));
        assert!(approx(fixed.x, 600.0));
        assert!(approx(fixed.y, 0.0));
    }

    #[test]
    fn constrain_shrinks_rect_larger_than_surface() {
        let dragged = CropRegion::pixels(0.0, 0.0, 2000.0, 10.0);
        let fixed = constrain_to_surface(&dragged, 16.0 / 9.0, 1000.0, 400.0).expect("constrained");

        assert!(approx(fixed.height, 400.0));
        assert!(approx(fixed.width, 400.0 * 16.0 / 9.0));
        assert!(fixed.fits_within(1000.0, 400.0));
    }

    #[test]
    fn well_formed_rejects_non_positive_sizes() {
        assert!(CropRegion::pixels(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!CropRegion::pixels(0.0, 0.0, 0.0, 1.0).is_well_formed());
        assert!(!CropRegion::pixels(-1.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!CropRegion::pixels(0.0, 0.0, f64::INFINITY, 1.0).is_well_formed());
    }
}
