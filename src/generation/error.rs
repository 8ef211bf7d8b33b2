//! 远端生成调用的错误分类。不做自动重试，错误原样上报给用户，由用户重新触发。

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("模型没有返回图片，请调整提示词后重试")]
    NoImageReturned,

    #[error("请求过于频繁：{0}")]
    RateLimited(String),

    #[error("API 凭据无效：{0}")]
    InvalidCredential(String),

    #[error("生成失败：{0}")]
    Unknown(String),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoImageReturned => "no_image_returned",
            Self::RateLimited(_) => "rate_limited",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::Unknown(_) => "unknown",
        }
    }
}
