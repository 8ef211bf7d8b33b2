//! # Gemini `generateContent` 客户端
//!
//! ## 设计思路
//!
//! 两次调用共用同一个复用型 HTTP 客户端：
//! 1. 文本模型：风格设置（+ 风格参考图）→ 提示词
//! 2. 图像模型：产品图（+ 风格参考图）+ 提示词 → 新图
//!
//! ## 实现思路
//!
//! - 凭据通过 `x-goog-api-key` 请求头传递，不出现在 URL 与日志中。
//! - 非 2xx 响应按状态码与错误体归类为 `RateLimited` / `InvalidCredential` / `Unknown`。
//! - 响应里没有图片数据时报 `NoImageReturned`，绝不静默返回空结果。

use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::codec::{EncodedImage, ImageMime};
use crate::config::StudioConfig;
use crate::error::AppError;
use crate::style::StyleSettings;

use super::prompt::{build_edit_instruction, build_synthesis_instruction};
use super::{GenerationClient, GenerationError};

const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: RequestInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestInlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    fn image(image: &EncodedImage) -> Self {
        Self::Inline {
            inline_data: RequestInlineData {
                mime_type: image.mime().as_str(),
                data: image.to_portable_text(),
            },
        }
    }
}

impl GenerateContentRequest {
    fn from_user(parts: Vec<RequestPart>, generation_config: Option<GenerationConfig>) -> Self {
        Self {
            contents: vec![RequestContent { role: "user", parts }],
            generation_config,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    #[serde(default, alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    /// 用于诊断的拒答原因（安全拦截、finish reason 等）。
    fn refusal_hint(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Some(format!("blockReason={}", reason));
        }
        self.candidates
            .iter()
            .find_map(|candidate| candidate.finish_reason.clone())
            .filter(|reason| reason != "STOP")
            .map(|reason| format!("finishReason={}", reason))
    }
}

// ============================================================================
// Client
// ============================================================================

/// 基于 Gemini REST API 的生成客户端。
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
    request_timeout_secs: u64,
}

impl GeminiClient {
    /// 根据配置创建客户端，HTTP 客户端只构建一次并复用。
    pub fn new(config: &StudioConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let endpoint = self.endpoint(model);
        log::debug!("📡 调用模型 - {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            return Err(classify_api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| GenerationError::Unknown(format!("响应解析失败：{}", e)))
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Unknown(format!("请求超时（{}秒）", self.request_timeout_secs))
        } else if e.is_connect() {
            GenerationError::Unknown(format!("无法连接：{}", e))
        } else {
            GenerationError::Unknown(format!("请求失败：{}", e))
        }
    }
}

impl GenerationClient for GeminiClient {
    async fn synthesize_prompt(
        &self,
        settings: &StyleSettings,
        style_image: Option<&EncodedImage>,
    ) -> Result<String, GenerationError> {
        let start = Instant::now();

        let mut parts = Vec::with_capacity(2);
        if let Some(style) = style_image {
            parts.push(RequestPart::image(style));
        }
        parts.push(RequestPart::text(build_synthesis_instruction(
            settings,
            style_image.is_some(),
        )));

        let request = GenerateContentRequest::from_user(parts, None);
        let response = self.generate_content(&self.text_model, &request).await?;
        let prompt = extract_prompt(&response)?;

        log::info!(
            "📝 提示词合成完成 - 长度: {} 风格参考图: {} 耗时: {}ms",
            prompt.len(),
            style_image.is_some(),
            start.elapsed().as_millis()
        );
        Ok(prompt)
    }

    async fn edit_image(
        &self,
        product_image: &EncodedImage,
        prompt: &str,
        style_image: Option<&EncodedImage>,
    ) -> Result<EncodedImage, GenerationError> {
        let start = Instant::now();

        let mut parts = Vec::with_capacity(3);
        parts.push(RequestPart::image(product_image));
        if let Some(style) = style_image {
            parts.push(RequestPart::image(style));
        }
        parts.push(RequestPart::text(build_edit_instruction(
            prompt,
            style_image.is_some(),
        )));

        let request = GenerateContentRequest::from_user(
            parts,
            Some(GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            }),
        );
        let response = self.generate_content(&self.image_model, &request).await?;
        let image = extract_image(&response)?;

        log::info!(
            "🎨 图片生成完成 - 格式: {} 体积: {} bytes 耗时: {}ms",
            image.mime(),
            image.len(),
            start.elapsed().as_millis()
        );
        Ok(image)
    }
}

// ============================================================================
// Response handling
// ============================================================================

fn extract_prompt(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    let text = response
        .parts()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string();

    if text.is_empty() {
        let hint = response.refusal_hint().unwrap_or_else(|| "空响应".to_string());
        return Err(GenerationError::Unknown(format!("模型未返回提示词（{}）", hint)));
    }
    Ok(text)
}

fn extract_image(response: &GenerateContentResponse) -> Result<EncodedImage, GenerationError> {
    let mut inline_parts = response
        .parts()
        .filter_map(|part| part.inline_data.as_ref())
        .filter(|inline| !inline.data.is_empty());

    let Some(inline) = inline_parts.next() else {
        let text = response
            .parts()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ");
        log::warn!(
            "⚠️ 模型响应中没有图片 - {} 文本: {}",
            response.refusal_hint().unwrap_or_default(),
            text
        );
        return Err(GenerationError::NoImageReturned);
    };

    let extra = inline_parts.count();
    if extra > 0 {
        log::debug!("模型返回了多张图片，仅使用第一张（忽略 {} 张）", extra);
    }

    let bytes = general_purpose::STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| GenerationError::Unknown(format!("图片 Base64 解码失败：{}", e)))?;

    let mime = ImageMime::from_mime_str(&inline.mime_type)
        .ok()
        .or_else(|| {
            infer::get(&bytes).and_then(|kind| ImageMime::from_mime_str(kind.mime_type()).ok())
        })
        .ok_or_else(|| {
            GenerationError::Unknown(format!("模型返回了不支持的图片类型：{}", inline.mime_type))
        })?;

    Ok(EncodedImage::new(bytes, mime))
}

/// 按 HTTP 状态码与错误体归类远端错误。
fn classify_api_error(status: u16, body: &str) -> GenerationError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let api_status = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.status.clone())
        .unwrap_or_default();
    let message = parsed
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        return GenerationError::RateLimited(message);
    }

    if status == 401
        || status == 403
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED"
        || body.contains("API_KEY_INVALID")
    {
        return GenerationError::InvalidCredential(message);
    }

    GenerationError::Unknown(format!("HTTP {}：{}", status, message))
}
