//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，编解码、裁剪、生成三条链路的错误都经由 `#[from]` 汇入，
//! 服务层与 CLI 只面对这一个类型。
//!
//! 用户可见的错误统一落成一条 `ErrorBanner`：稳定错误码 + 阶段 + 人类可读消息，
//! 可以被关闭，不会打断会话中的其他数据。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 实现 `Serialize` 将错误序列化为字符串，与横幅的 `message` 字段一致。

use serde::Serialize;

use crate::codec::CodecError;
use crate::crop::CropError;
use crate::generation::GenerationError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片校验 / 解码 / 裁剪 / 编码失败
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// 裁剪状态机拒绝了本次操作
    #[error("{0}")]
    Crop(#[from] CropError),

    /// 远端生成失败
    #[error("{0}")]
    Generation(#[from] GenerationError),

    /// 启动配置缺失或非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 同类请求已在进行中
    #[error("{0}正在进行中，请稍候")]
    Busy(&'static str),

    /// 缺少前置输入
    #[error("缺少{0}")]
    MissingInput(&'static str),

    /// 后台任务异常退出
    #[error("后台任务失败: {0}")]
    Task(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.code(),
            Self::Crop(e) => e.code(),
            Self::Generation(e) => e.code(),
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Busy(_) => "busy",
            Self::MissingInput(_) => "missing_input",
            Self::Task(_) => "task_failed",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.stage(),
            Self::Crop(_) => "crop",
            Self::Generation(_) => "generate",
            Self::Config(_) => "startup",
            Self::Io(_) => "io",
            Self::Busy(_) | Self::MissingInput(_) => "request",
            Self::Task(_) => "internal",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// 可关闭的错误横幅，同一时刻最多一条。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorBanner {
    fn from(error: &AppError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}
