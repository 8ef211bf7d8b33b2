//! # AI 产品摄影工作室 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    CLI (clap, main.rs)                   │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ↕ Result<T, AppError>
//! ┌───────────────────────────┼──────────────────────────────┐
//! │  ┌─ studio ──── 会话状态 + 流程编排 + 错误横幅             │
//! │  │   ├─ InFlightGuard (RAII) 单飞行请求                    │
//! │  │   └─ watch 通道 提示词触发 + 序号过期丢弃               │
//! │  │                                                       │
//! │  ├─ crop ────── 裁剪状态机 / 几何计算 / 视口布局           │
//! │  ├─ codec ───── 解码·裁剪映射·编码·Base64                  │
//! │  ├─ generation  GenerationClient trait + Gemini 实现       │
//! │  ├─ style ───── 比例 / 布光 / 机位 选项                    │
//! │  ├─ config ──── 环境变量 + JSON 覆盖                       │
//! │  └─ error ───── AppError / ErrorBanner                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` 与可关闭的 `ErrorBanner` |
//! | [`config`] | 启动配置：凭据、模型、超时、编解码上限、视口 |
//! | [`style`] | 风格设置值对象及其选项枚举 |
//! | [`codec`] | 上传校验、解码、显示坐标到原图像素的裁剪映射、编码 |
//! | [`crop`] | 裁剪交互状态机与纯几何函数 |
//! | [`generation`] | 远端提示词合成与图片编辑 |
//! | [`studio`] | 把以上模块串成完整会话的服务层 |

pub mod error;
pub mod config;
pub mod style;
pub mod codec;
pub mod crop;
pub mod generation;
pub mod studio;
