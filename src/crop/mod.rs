//! # 裁剪交互模块（crop）
//!
//! ## 设计思路
//!
//! 维护“当前合法的裁剪框”，响应图片加载、比例切换、拖拽与缩放四类事件。
//!
//! - `region`：裁剪矩形、单位换算、居中初始框与交互面的边界/比例约束（纯函数）
//! - `layout`：原图放入裁剪面板时的显示尺寸
//! - `session`：状态机本体，保存时调用 `codec::crop_and_encode`
//! - `error`：被拒绝迁移的原因
//!
//! ## 分工
//!
//! 拖拽矩形的边界与比例由交互面（`constrain_to_surface`）负责，状态机只做最小检查，
//! 两处不重复实现同一约束。

mod error;
mod layout;
mod region;
mod session;

pub use error::CropError;
pub use layout::Viewport;
pub use region::{CropRegion, CropUnit, INITIAL_EXTENT, centered_aspect_crop, constrain_to_surface};
pub use session::{CropEvent, CropSession, CropState, MAX_ZOOM, MIN_ZOOM};
