//! 生成结果的下载表示。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::{EncodedImage, ImageMime};
use crate::error::AppError;

/// 下载使用的固定文件名。
pub const DOWNLOAD_FILENAME: &str = "ai-photo-studio-result.png";

/// 预览与下载共用的 Data URI 表示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub filename: String,
    pub mime: ImageMime,
    pub data_uri: String,
}

impl Download {
    pub fn from_image(image: &EncodedImage) -> Self {
        Self {
            filename: DOWNLOAD_FILENAME.to_string(),
            mime: image.mime(),
            data_uri: image.to_data_uri(),
        }
    }
}

/// 将结果字节写入 `dir/ai-photo-studio-result.png`，目录不存在时自动创建。
pub(crate) fn write_download(dir: &Path, image: &EncodedImage) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILENAME);
    fs::write(&path, image.payload())?;
    log::info!(
        "💾 结果已保存 - {} ({} bytes, {})",
        path.display(),
        image.len(),
        image.mime()
    );
    Ok(path)
}
