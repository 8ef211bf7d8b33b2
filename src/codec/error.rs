//! # 编解码错误模型
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“校验 → 解码 → 裁剪 → 编码”链路中的所有失败，
//! 调用侧既能读到人类可读消息，也能按分支匹配或读取稳定的 `code()`。

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

/// 图片编解码统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("不支持的图片格式：{0}（仅支持 image/jpeg、image/png、image/webp）")]
    UnsupportedFormat(String),

    #[error("文件过大：{:.2} MB（限制：{:.2} MB）", mib(.size), mib(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("裁剪区域为空：映射到原图后为 {width:.2}x{height:.2} 像素，取整后为 0")]
    CropRegionEmpty { width: f64, height: f64 },

    #[error("无法创建输出画布：{0}")]
    ContextUnavailable(String),

    #[error("编码失败：{0}")]
    EncodeFailed(String),

    #[error("无效的 Data URI：{0}")]
    InvalidDataUri(String),
}

impl CodecError {
    /// 稳定错误码，供前端/日志归类。
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::Decode(_) => "decode_failed",
            Self::ResourceLimit(_) => "resource_limit",
            Self::CropRegionEmpty { .. } => "crop_region_empty",
            Self::ContextUnavailable(_) => "context_unavailable",
            Self::EncodeFailed(_) => "encode_failed",
            Self::InvalidDataUri(_) => "invalid_data_uri",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) | Self::FileTooLarge { .. } | Self::InvalidDataUri(_) => {
                "validate"
            }
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::CropRegionEmpty { .. } | Self::ContextUnavailable(_) => "crop",
            Self::EncodeFailed(_) => "encode",
        }
    }
}
