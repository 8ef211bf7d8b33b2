//! 远端生成服务的两函数接口。
//!
//! 核心逻辑只依赖这个 trait：生产环境使用 `GeminiClient`，测试注入假实现。
//! 每次调用相互独立、无状态，不做重试、缓存或批处理。

use std::future::Future;

use crate::codec::EncodedImage;
use crate::style::StyleSettings;

use super::GenerationError;

pub trait GenerationClient: Send + Sync + 'static {
    /// 根据风格设置（以及可选的风格参考图）合成文本提示词。
    fn synthesize_prompt(
        &self,
        settings: &StyleSettings,
        style_image: Option<&EncodedImage>,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;

    /// 以产品图为底图按提示词生成新图。必须恰好返回一张图，否则报 `NoImageReturned`。
    fn edit_image(
        &self,
        product_image: &EncodedImage,
        prompt: &str,
        style_image: Option<&EncodedImage>,
    ) -> impl Future<Output = Result<EncodedImage, GenerationError>> + Send;
}
