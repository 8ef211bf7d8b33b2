//! # 图片编解码模块（codec）
//!
//! ## 设计思路
//!
//! 负责“上传字节 ↔ 像素缓冲 ↔ 裁剪后的传输编码”三者之间的转换，按职责拆分子模块：
//!
//! - `config`：上传体积、像素与内存上限
//! - `format`：受支持的 MIME 集合（jpeg / png / webp）
//! - `decode`：快速拒绝 + 头信息探测 + 完整解码
//! - `raster`：解码后的位图、显示尺寸与缩放因子
//! - `crop`：显示坐标 → 原图像素的映射与区域拷贝
//! - `encode`：最高质量编码
//! - `encoded`：不可变的压缩结果与 Base64 / Data URI 转换
//! - `error`：统一错误类型
//!
//! ## 调用链
//!
//! ```text
//! 上传字节 + 声明类型
//!    ↓
//! decode.rs（类型/体积快速拒绝 → 像素上限 → 解码）
//!    ↓
//! RasterImage（natural + displayed 尺寸）
//!    ↓  ← 裁剪状态机提供 CropRegion 与显示尺寸
//! crop.rs（缩放映射 → 向下取整 → 区域拷贝）
//!    ↓
//! encode.rs（质量 1.0）
//!    ↓
//! EncodedImage → to_portable_text / to_data_uri
//! ```
//!
//! 所有函数都是同步纯计算，由上层决定放到阻塞线程池执行。

mod config;
mod crop;
mod decode;
mod encode;
mod encoded;
mod error;
mod format;
mod raster;

pub use config::{CodecConfig, DEFAULT_MAX_FILE_SIZE};
pub use crop::{SourceRect, crop_and_encode, map_to_natural};
pub use decode::{check_upload_size, decode};
pub use encode::encode;
pub use encoded::{EncodedImage, to_portable_text};
pub use error::CodecError;
pub use format::ImageMime;
pub use raster::{RasterImage, ScaleFactor};
