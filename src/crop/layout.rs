//! 裁剪面板布局：原图按比例缩小放进视口，不放大。

use serde::{Deserialize, Serialize};

/// 裁剪面板可用的最大显示区域（界面像素）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 600.0,
        }
    }
}

impl Viewport {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// 计算原图在视口中的显示尺寸。
    ///
    /// 任一输入为零或非有限时返回 `(0, 0)`，由上层拒绝。
    pub fn fit(&self, natural_width: u32, natural_height: u32) -> (f64, f64) {
        if natural_width == 0
            || natural_height == 0
            || !(self.max_width.is_finite() && self.max_width > 0.0)
            || !(self.max_height.is_finite() && self.max_height > 0.0)
        {
            return (0.0, 0.0);
        }

        let width = natural_width as f64;
        let height = natural_height as f64;
        let scale = (self.max_width / width)
            .min(self.max_height / height)
            .min(1.0);

        (width * scale, height * scale)
    }
}
