//! # 启动配置
//!
//! ## 设计思路
//!
//! 配置按三层叠加：内置默认值 → 进程环境变量 → 可选的 JSON 覆盖文件。
//! API 凭据只能来自环境变量，缺失时直接拒绝启动，不进入任何半可用状态。
//!
//! ## 实现思路
//!
//! - 环境变量读取抽象为 `lookup` 闭包，测试无需修改真实进程环境。
//! - 覆盖文件缺失或无法解析时回退默认值并记录警告，不阻断启动。
//! - `Debug` 输出对凭据脱敏。

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::CodecConfig;
use crate::crop::Viewport;
use crate::error::AppError;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_API_BASE: &str = "STUDIO_API_BASE";
pub const ENV_TEXT_MODEL: &str = "STUDIO_TEXT_MODEL";
pub const ENV_IMAGE_MODEL: &str = "STUDIO_IMAGE_MODEL";
pub const ENV_CONFIG_PATH: &str = "STUDIO_CONFIG";

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// JSON 覆盖文件，所有字段可选。
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub api_base: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<u64>,
    pub max_decoded_pixels: Option<u64>,
    pub viewport_width: Option<f64>,
    pub viewport_height: Option<f64>,
}

/// 读取覆盖文件；文件不存在或内容非法时回退为空覆盖。
pub fn load_overlay_from_path(config_path: &Path) -> ConfigOverlay {
    if !config_path.exists() {
        log::warn!("⚠️ 配置文件不存在，使用默认值: {}", config_path.display());
        return ConfigOverlay::default();
    }

    match fs::read_to_string(config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(overlay) => overlay,
            Err(e) => {
                log::warn!("⚠️ 解析配置文件失败，使用默认值: {} ({})", config_path.display(), e);
                ConfigOverlay::default()
            }
        },
        Err(e) => {
            log::warn!("⚠️ 读取配置文件失败，使用默认值: {} ({})", config_path.display(), e);
            ConfigOverlay::default()
        }
    }
}

/// 运行期配置快照。
#[derive(Clone)]
pub struct StudioConfig {
    pub api_key: String,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub codec: CodecConfig,
    pub viewport: Viewport,
}

impl fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_key", &if self.api_key.is_empty() { "<未设置>" } else { "***" })
            .field("api_base", &self.api_base)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("codec", &self.codec)
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl StudioConfig {
    /// 默认配置 + 指定凭据。
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            codec: CodecConfig::default(),
            viewport: Viewport::default(),
        }
    }

    /// 从进程环境加载，凭据必填。`config_path` 优先于 `STUDIO_CONFIG`。
    pub fn load(config_path: Option<&Path>) -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok(), config_path, true)
    }

    /// 只做本地裁剪时使用，不要求凭据。
    pub fn load_local(config_path: Option<&Path>) -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok(), config_path, false)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        config_path: Option<&Path>,
        require_api_key: bool,
    ) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = non_empty(ENV_API_KEY)
            .or_else(|| non_empty(ENV_API_KEY_FALLBACK))
            .unwrap_or_default();
        if require_api_key && api_key.is_empty() {
            return Err(AppError::Config(format!(
                "未设置 API 凭据，请配置环境变量 {} 或 {}",
                ENV_API_KEY, ENV_API_KEY_FALLBACK
            )));
        }

        let mut config = Self::with_api_key(api_key);
        if let Some(api_base) = non_empty(ENV_API_BASE) {
            config.api_base = api_base;
        }
        if let Some(model) = non_empty(ENV_TEXT_MODEL) {
            config.text_model = model;
        }
        if let Some(model) = non_empty(ENV_IMAGE_MODEL) {
            config.image_model = model;
        }

        let overlay_path = config_path
            .map(Path::to_path_buf)
            .or_else(|| non_empty(ENV_CONFIG_PATH).map(PathBuf::from));
        if let Some(path) = overlay_path {
            config.apply_overlay(load_overlay_from_path(&path));
            log::info!("📄 已加载配置覆盖文件: {}", path.display());
        }

        config.validate()?;
        log::debug!("配置就绪: {:?}", config);
        Ok(config)
    }

    pub fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(api_base) = overlay.api_base {
            self.api_base = api_base;
        }
        if let Some(model) = overlay.text_model {
            self.text_model = model;
        }
        if let Some(model) = overlay.image_model {
            self.image_model = model;
        }
        if let Some(secs) = overlay.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = overlay.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(bytes) = overlay.max_upload_bytes {
            self.codec.max_file_size = bytes;
        }
        if let Some(pixels) = overlay.max_decoded_pixels {
            self.codec.max_decoded_pixels = pixels;
        }
        if let Some(width) = overlay.viewport_width {
            self.viewport.max_width = width;
        }
        if let Some(height) = overlay.viewport_height {
            self.viewport.max_height = height;
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.codec
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(AppError::Config(format!("api_base 必须是 http(s) 地址: {}", self.api_base)));
        }
        if self.text_model.trim().is_empty() || self.image_model.trim().is_empty() {
            return Err(AppError::Config("模型名称不能为空".to_string()));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(AppError::Config("超时时间必须大于 0 秒".to_string()));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.viewport.max_width) || !positive(self.viewport.max_height) {
            return Err(AppError::Config(format!(
                "视口尺寸无效: {}x{}",
                self.viewport.max_width, self.viewport.max_height
            )));
        }
        Ok(())
    }
}
