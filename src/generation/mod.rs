//! # 远端生成模块
//!
//! ## 设计思路
//!
//! 生成服务被抽象为两个无状态函数（提示词合成、图片编辑），统一放在 `GenerationClient` trait 后面。
//! 上层服务层只认识 trait，从而可以在测试中注入确定性的假实现。
//!
//! ## 调用链
//!
//! ```text
//! Studio::synthesize_prompt ──▶ GenerationClient::synthesize_prompt ──▶ 文本模型
//! Studio::generate          ──▶ GenerationClient::edit_image        ──▶ 图像模型
//! ```

mod client;
mod error;
mod gemini;
mod prompt;

pub use client::GenerationClient;
pub use error::GenerationError;
pub use gemini::GeminiClient;
pub use prompt::{build_edit_instruction, build_synthesis_instruction};
