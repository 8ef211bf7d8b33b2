//! 受支持的图片 MIME 类型。

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::CodecError;

/// 上传与输出允许的图片格式（固定集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMime {
    pub const ALL: [ImageMime; 3] = [Self::Jpeg, Self::Png, Self::Webp];

    /// 解析声明的 MIME 字符串，不在支持集合内即 `UnsupportedFormat`。
    pub fn from_mime_str(mime: &str) -> Result<Self, CodecError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            other => Err(CodecError::UnsupportedFormat(if other.is_empty() {
                "<未声明>".to_string()
            } else {
                other.to_string()
            })),
        }
    }

    /// 按扩展名推断，相当于浏览器给文件赋的 `type`。
    pub fn from_path(path: &Path) -> Result<Self, CodecError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(CodecError::UnsupportedFormat(format!("扩展名 .{}", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
