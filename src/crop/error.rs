//! 裁剪状态机的拒绝原因。被拒绝的迁移不会改动已有状态。

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CropError {
    #[error("尚未加载图片，无法调整裁剪框")]
    NotInitialized,

    #[error("图片尺寸无效：{width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("裁剪框无效：{0}")]
    InvalidRegion(String),

    #[error("缩放倍数超出范围：{0}（允许 1.0 ~ 3.0）")]
    ZoomOutOfRange(f64),
}

impl CropError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "crop_not_initialized",
            Self::InvalidDimensions { .. } => "invalid_dimensions",
            Self::InvalidRegion(_) => "invalid_region",
            Self::ZoomOutOfRange(_) => "zoom_out_of_range",
        }
    }
}
