//! # 裁剪交互状态机
//!
//! ## 设计思路
//!
//! 状态只有两个：`Uninitialized`（还没有图片）与 `Initialized`（已有合法裁剪框）。
//! 每个迁移要么完整生效，要么返回 `CropError` 且保持原状态，不存在“半更新”的矩形。
//!
//! ## 实现思路
//!
//! - 图片加载、切换比例：都重新计算居中的初始裁剪框，切换比例会丢弃用户的拖拽结果
//! - 拖拽：直接采用交互面给出的矩形，只做非负 / 正尺寸检查
//! - 缩放：只改变显示尺寸（从而改变缩放因子），不改变裁剪框
//! - 保存：用当前显示尺寸把裁剪框映射回原图并编码

use crate::codec::{self, CodecConfig, EncodedImage, ImageMime, RasterImage};
use crate::error::AppError;
use crate::style::AspectRatio;

use super::{CropError, CropRegion, Viewport, centered_aspect_crop};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CropState {
    Uninitialized,
    Initialized {
        region: CropRegion,
        aspect: AspectRatio,
    },
}

/// 驱动状态机的事件。
#[derive(Debug, Clone)]
pub enum CropEvent {
    ImageLoaded {
        image: RasterImage,
        aspect: AspectRatio,
    },
    AspectRatioChanged(AspectRatio),
    UserDrag(CropRegion),
    ZoomChanged(f64),
}

/// 一次裁剪对话框的生命周期：打开时创建，保存或取消时整体销毁。
#[derive(Debug, Clone)]
pub struct CropSession {
    viewport: Viewport,
    limits: CodecConfig,
    image: Option<RasterImage>,
    base_size: (f64, f64),
    zoom: f64,
    state: CropState,
}

impl CropSession {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_limits(viewport, CodecConfig::default())
    }

    /// 保存时输出画布受 `limits` 约束。
    pub fn with_limits(viewport: Viewport, limits: CodecConfig) -> Self {
        Self {
            viewport,
            limits,
            image: None,
            base_size: (0.0, 0.0),
            zoom: MIN_ZOOM,
            state: CropState::Uninitialized,
        }
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, CropState::Initialized { .. })
    }

    pub fn region(&self) -> Option<&CropRegion> {
        match &self.state {
            CropState::Initialized { region, .. } => Some(region),
            CropState::Uninitialized => None,
        }
    }

    pub fn aspect(&self) -> Option<AspectRatio> {
        match self.state {
            CropState::Initialized { aspect, .. } => Some(aspect),
            CropState::Uninitialized => None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// 当前显示尺寸（已包含缩放）。
    pub fn displayed_size(&self) -> Option<(f64, f64)> {
        self.image
            .as_ref()
            .map(|image| (image.displayed_width(), image.displayed_height()))
    }

    pub fn apply(&mut self, event: CropEvent) -> Result<(), CropError> {
        match event {
            CropEvent::ImageLoaded { image, aspect } => self.on_image_load(image, aspect).map(|_| ()),
            CropEvent::AspectRatioChanged(aspect) => {
                self.on_aspect_ratio_changed(aspect).map(|_| ())
            }
            CropEvent::UserDrag(rect) => self.on_user_drag(rect),
            CropEvent::ZoomChanged(scale) => self.on_zoom_changed(scale),
        }
    }

    /// 图片加载完成：按视口布局计算显示尺寸，生成居中的初始裁剪框。
    pub fn on_image_load(
        &mut self,
        mut image: RasterImage,
        aspect: AspectRatio,
    ) -> Result<CropRegion, CropError> {
        let (natural_width, natural_height) = (image.natural_width(), image.natural_height());
        if natural_width == 0 || natural_height == 0 {
            return Err(CropError::InvalidDimensions {
                width: natural_width,
                height: natural_height,
            });
        }

        let (width, height) = self.viewport.fit(natural_width, natural_height);
        let region = centered_aspect_crop(width, height, aspect.ratio()).ok_or(
            CropError::InvalidDimensions {
                width: natural_width,
                height: natural_height,
            },
        )?;

        image.set_displayed_size(width, height);
        self.base_size = (width, height);
        self.zoom = MIN_ZOOM;
        self.image = Some(image);
        self.state = CropState::Initialized { region, aspect };

        log::debug!(
            "🖼️ 裁剪会话初始化 - 原图: {}x{} 显示: {:.1}x{:.1} 比例: {}",
            natural_width,
            natural_height,
            width,
            height,
            aspect
        );

        Ok(region)
    }

    /// 切换比例：按当前显示尺寸重新生成居中裁剪框，丢弃之前的拖拽。
    pub fn on_aspect_ratio_changed(&mut self, aspect: AspectRatio) -> Result<CropRegion, CropError> {
        let (width, height) = self.displayed_size().ok_or(CropError::NotInitialized)?;
        let region = centered_aspect_crop(width, height, aspect.ratio())
            .ok_or_else(|| CropError::InvalidRegion(format!("显示尺寸 {}x{} 无效", width, height)))?;

        self.state = CropState::Initialized { region, aspect };
        Ok(region)
    }

    /// 采用交互面给出的矩形。边界与比例由交互面保证，这里只拒绝负坐标与非正尺寸。
    pub fn on_user_drag(&mut self, rect: CropRegion) -> Result<(), CropError> {
        let CropState::Initialized { aspect, .. } = self.state else {
            return Err(CropError::NotInitialized);
        };

        if !rect.is_well_formed() {
            return Err(CropError::InvalidRegion(format!(
                "({}, {}, {}x{})",
                rect.x, rect.y, rect.width, rect.height
            )));
        }

        self.state = CropState::Initialized {
            region: rect,
            aspect,
        };
        Ok(())
    }

    /// 视图放大：显示尺寸乘以倍数，裁剪框保持不变。
    pub fn on_zoom_changed(&mut self, scale: f64) -> Result<(), CropError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&scale) {
            return Err(CropError::ZoomOutOfRange(scale));
        }
        let image = self.image.as_mut().ok_or(CropError::NotInitialized)?;

        let (base_width, base_height) = self.base_size;
        image.set_displayed_size(base_width * scale, base_height * scale);
        self.zoom = scale;
        Ok(())
    }

    /// 按上传时声明的类型保存。
    pub fn save(&self) -> Result<EncodedImage, AppError> {
        let image = self.image.as_ref().ok_or(CropError::NotInitialized)?;
        self.save_as(image.declared_mime())
    }

    /// 取消裁剪：丢弃会话持有的位图与裁剪框。
    pub fn cancel(self) {
        if let Some(image) = &self.image {
            log::debug!(
                "裁剪已取消 - 释放 {}x{} 位图",
                image.natural_width(),
                image.natural_height()
            );
        }
    }

    /// 把当前裁剪框映射回原图像素并编码为 `output`。
    pub fn save_as(&self, output: ImageMime) -> Result<EncodedImage, AppError> {
        let (Some(image), Some(region)) = (self.image.as_ref(), self.region()) else {
            return Err(CropError::NotInitialized.into());
        };
        Ok(codec::crop_and_encode(image, region, output, &self.limits)?)
    }
}
