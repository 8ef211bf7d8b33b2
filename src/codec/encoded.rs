//! # 压缩后的图片与文本传输编码
//!
//! ## 设计思路
//!
//! `EncodedImage` 一经产生即不可变：载荷用 `Bytes` 持有，克隆只增加引用计数，
//! 在会话状态、远端请求与下载之间传递时不复制字节。
//!
//! ## 实现思路
//!
//! - `to_portable_text`：标准 Base64，与 Data URI 的载荷段互逆。
//! - `from_data_uri`：先按 Base64 长度估算解码上限，超限直接拒绝，再真正解码。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;

use super::{CodecError, ImageMime};

/// 压缩字节 + MIME 类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    payload: Bytes,
    mime: ImageMime,
}

impl EncodedImage {
    pub fn new(payload: impl Into<Bytes>, mime: ImageMime) -> Self {
        Self {
            payload: payload.into(),
            mime,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// 文本安全的传输编码（标准 Base64）。
    pub fn to_portable_text(&self) -> String {
        to_portable_text(self)
    }

    /// `data:<mime>;base64,<payload>`，预览与下载共用。
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.to_portable_text())
    }

    /// 包装用户上传的原始字节，只接受受支持的声明类型与体积。
    pub fn from_upload(
        payload: impl Into<Bytes>,
        declared_mime: &str,
        max_size: u64,
    ) -> Result<Self, CodecError> {
        let mime = ImageMime::from_mime_str(declared_mime)?;
        let payload = payload.into();
        let size = payload.len() as u64;
        if size > max_size {
            return Err(CodecError::FileTooLarge {
                size,
                limit: max_size,
            });
        }
        Ok(Self::new(payload, mime))
    }

    /// 解析 `data:image/...;base64,...`，解码后体积不得超过 `max_size`。
    pub fn from_data_uri(data: &str, max_size: u64) -> Result<Self, CodecError> {
        let normalized = data.trim();
        let rest = normalized
            .strip_prefix("data:")
            .ok_or_else(|| CodecError::InvalidDataUri("缺少 data: 前缀".to_string()))?;

        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| CodecError::InvalidDataUri("缺少 base64 标记".to_string()))?;
        let mime = ImageMime::from_mime_str(mime)?;

        let estimated = estimate_base64_decoded_len(payload);
        if estimated > max_size {
            return Err(CodecError::FileTooLarge {
                size: estimated,
                limit: max_size,
            });
        }

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CodecError::InvalidDataUri(format!("Base64 解码失败：{}", e)))?;

        Ok(Self::new(bytes, mime))
    }
}

/// 将压缩字节转换为文本传输编码。
pub fn to_portable_text(encoded: &EncodedImage) -> String {
    general_purpose::STANDARD.encode(&encoded.payload)
}

/// Base64 解码后长度的上界估算（不分配内存）。
fn estimate_base64_decoded_len(data: &str) -> u64 {
    let len = data.trim_end_matches('=').len() as u64;
    len / 4 * 3 + (len % 4) * 3 / 4
}
