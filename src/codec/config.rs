//! # 编解码配置
//!
//! ## 设计思路
//!
//! 所有“可调上限”集中在 `CodecConfig`，上传校验、解码内存控制与 Data URI 解析共用同一份快照，
//! 保证一次处理链路内参数一致。

use super::CodecError;

/// 默认上传体积上限：10 MiB。
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 图片编解码配置。
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    /// 上传原始字节允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

impl CodecConfig {
    /// 校验外部覆盖后的配置。
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.max_file_size == 0 {
            return Err(CodecError::ResourceLimit("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(CodecError::ResourceLimit(
                "max_decoded_pixels 不能为 0".to_string(),
            ));
        }
        if self.max_decoded_bytes < 4 * 1024 * 1024 {
            return Err(CodecError::ResourceLimit(
                "max_decoded_bytes 不能小于 4MB".to_string(),
            ));
        }
        Ok(())
    }

    /// 校验像素数量是否超过配置上限。
    pub(crate) fn check_pixel_limits(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| CodecError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(CodecError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| CodecError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.max_decoded_bytes {
            return Err(CodecError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}
