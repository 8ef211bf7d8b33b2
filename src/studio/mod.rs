//! # 工作室服务层
//!
//! 把编解码、裁剪状态机与远端生成客户端组合成一次完整的会话流程：
//!
//! ```text
//! upload_product ─▶ CropSession ─▶ save_crop ─▶ 产品图
//!                                                  │
//! set_settings / upload_style ─▶ 提示词触发 ─▶ 提示词 │
//!                                                  ▼
//!                                    generate ─▶ 生成结果 ─▶ download
//! ```

mod download;
mod guard;
mod service;

pub use download::{DOWNLOAD_FILENAME, Download};
pub use service::{PromptInputs, Studio};
