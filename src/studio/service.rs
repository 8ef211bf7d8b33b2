//! # 工作室服务层
//!
//! ## 设计思路
//!
//! `Studio` 持有一次会话的全部共享状态（产品图、风格参考图、风格设置、提示词、生成结果、错误横幅），
//! 并把编解码、裁剪与远端生成串成完整流程。远端客户端以泛型注入，测试替换为假实现。
//!
//! ## 实现思路
//!
//! - 解码 / 裁剪编码放入 `spawn_blocking`，不阻塞其他异步任务。
//! - 状态锁只在同步代码段内持有，绝不跨越 `.await`。
//! - 提示词触发：风格设置或风格参考图变化时，通过 `watch` 通道发布一份 `PromptInputs`。
//!   每次合成都带一个单调递增的序号，完成时序号不大于“已应用序号”的结果视为过期并丢弃。
//! - 裁剪保存与图片生成各自最多一个在途请求，由 `InFlightGuard` 保证。
//! - 所有错误都会记录日志并写入唯一的错误横幅；失败不会覆盖已有的提示词或生成结果。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::codec::{self, EncodedImage, ImageMime};
use crate::config::StudioConfig;
use crate::crop::{CropEvent, CropSession};
use crate::error::{AppError, ErrorBanner};
use crate::generation::{GenerationClient, GenerationError};
use crate::style::StyleSettings;

use super::download::{Download, write_download};
use super::guard::InFlightGuard;

/// 一次提示词合成所需的全部输入。
#[derive(Debug, Clone, PartialEq)]
pub struct PromptInputs {
    pub settings: StyleSettings,
    pub style_image: Option<EncodedImage>,
    /// 单调递增的合成序号。
    pub seq: u64,
}

#[derive(Debug, Default)]
struct StudioState {
    settings: StyleSettings,
    product_image: Option<EncodedImage>,
    style_image: Option<EncodedImage>,
    prompt: String,
    last_seq: u64,
    applied_seq: u64,
    generated: Option<EncodedImage>,
    banner: Option<ErrorBanner>,
}

impl StudioState {
    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }

    fn prompt_inputs(&mut self) -> PromptInputs {
        PromptInputs {
            settings: self.settings,
            style_image: self.style_image.clone(),
            seq: self.next_seq(),
        }
    }
}

pub struct Studio<C: GenerationClient> {
    config: StudioConfig,
    client: C,
    state: Mutex<StudioState>,
    prompt_tx: watch::Sender<PromptInputs>,
    crop_in_flight: AtomicBool,
    generate_in_flight: AtomicBool,
}

impl<C: GenerationClient> Studio<C> {
    pub fn new(config: StudioConfig, client: C) -> Self {
        let state = StudioState::default();
        let (prompt_tx, _) = watch::channel(PromptInputs {
            settings: state.settings,
            style_image: None,
            seq: 0,
        });

        Self {
            config,
            client,
            state: Mutex::new(state),
            prompt_tx,
            crop_in_flight: AtomicBool::new(false),
            generate_in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn state(&self) -> MutexGuard<'_, StudioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录日志并写入错误横幅（覆盖旧横幅），返回原错误供调用方继续传播。
    fn record_error(&self, error: AppError) -> AppError {
        log::error!("❌ [{}/{}] {}", error.stage(), error.code(), error);
        self.state().banner = Some(ErrorBanner::from(&error));
        error
    }

    fn publish_prompt_trigger(&self, state: &mut StudioState) {
        let inputs = state.prompt_inputs();
        log::debug!("🔔 提示词触发 - 序号: {} 设置: {:?}", inputs.seq, inputs.settings);
        self.prompt_tx.send_replace(inputs);
    }

    // ------------------------------------------------------------------
    // 产品图上传与裁剪
    // ------------------------------------------------------------------

    /// 校验并解码上传的产品图，记录为当前产品图，并打开一个按当前比例初始化好的裁剪会话。
    pub async fn upload_product(
        &self,
        bytes: impl Into<Bytes>,
        declared_mime: &str,
    ) -> Result<CropSession, AppError> {
        self.open_crop_session(bytes.into(), declared_mime)
            .await
            .map_err(|e| self.record_error(e))
    }

    async fn open_crop_session(
        &self,
        bytes: Bytes,
        declared_mime: &str,
    ) -> Result<CropSession, AppError> {
        let codec_config = self.config.codec.clone();
        let declared = declared_mime.to_string();
        let payload = bytes.clone();
        let raster = tokio::task::spawn_blocking(move || {
            codec::decode(&payload, &declared, &codec_config)
        })
        .await
        .map_err(|e| AppError::Task(format!("解码任务异常退出: {}", e)))??;

        let aspect = {
            let mut state = self.state();
            state.product_image = Some(EncodedImage::new(bytes, raster.declared_mime()));
            state.settings.aspect_ratio
        };

        let mut session = CropSession::with_limits(self.config.viewport, self.config.codec.clone());
        session.on_image_load(raster, aspect)?;
        Ok(session)
    }

    /// 把裁剪面板上的一次操作交给会话；被拒绝的操作同样写入错误横幅，会话保持原状。
    pub fn apply_crop_event(
        &self,
        session: &mut CropSession,
        event: CropEvent,
    ) -> Result<(), AppError> {
        session
            .apply(event)
            .map_err(|e| self.record_error(e.into()))
    }

    /// 保存裁剪结果并替换产品图。同一时刻最多一个裁剪保存在途。
    ///
    /// `output` 为 `None` 时沿用上传时声明的类型。会话在保存后销毁。
    pub async fn save_crop(
        &self,
        session: CropSession,
        output: Option<ImageMime>,
    ) -> Result<EncodedImage, AppError> {
        let Some(_guard) = InFlightGuard::try_acquire(&self.crop_in_flight) else {
            return Err(self.record_error(AppError::Busy("裁剪保存")));
        };

        let result = tokio::task::spawn_blocking(move || match output {
            Some(mime) => session.save_as(mime),
            None => session.save(),
        })
        .await
        .map_err(|e| AppError::Task(format!("裁剪任务异常退出: {}", e)))
        .and_then(|saved| saved);

        match result {
            Ok(encoded) => {
                log::info!("✂️ 裁剪已保存 - {} bytes ({})", encoded.len(), encoded.mime());
                self.state().product_image = Some(encoded.clone());
                Ok(encoded)
            }
            Err(e) => Err(self.record_error(e)),
        }
    }

    // ------------------------------------------------------------------
    // 风格参考图与风格设置
    // ------------------------------------------------------------------

    /// 设置风格参考图。只校验类型与体积，不裁剪、不校验比例。
    pub fn upload_style(
        &self,
        bytes: impl Into<Bytes>,
        declared_mime: &str,
    ) -> Result<(), AppError> {
        let image = EncodedImage::from_upload(bytes, declared_mime, self.config.codec.max_file_size)
            .map_err(|e| self.record_error(e.into()))?;

        let mut state = self.state();
        if state.style_image.as_ref() == Some(&image) {
            return Ok(());
        }
        log::info!("🎨 风格参考图已更新 - {} bytes ({})", image.len(), image.mime());
        state.style_image = Some(image);
        self.publish_prompt_trigger(&mut state);
        Ok(())
    }

    pub fn clear_style(&self) {
        let mut state = self.state();
        if state.style_image.take().is_some() {
            log::info!("🎨 风格参考图已移除");
            self.publish_prompt_trigger(&mut state);
        }
    }

    /// 整体替换风格设置。只有真正变化时才触发提示词重新合成，返回是否变化。
    pub fn set_settings(&self, settings: StyleSettings) -> bool {
        let mut state = self.state();
        if state.settings == settings {
            return false;
        }
        state.settings = settings;
        self.publish_prompt_trigger(&mut state);
        true
    }

    // ------------------------------------------------------------------
    // 提示词
    // ------------------------------------------------------------------

    /// 用户手动编辑提示词。在途的自动合成结果随后到达时会被视为过期。
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let mut state = self.state();
        state.prompt = prompt.into();
        state.applied_seq = state.next_seq();
    }

    /// 订阅提示词触发事件。
    pub fn subscribe_prompt_triggers(&self) -> watch::Receiver<PromptInputs> {
        self.prompt_tx.subscribe()
    }

    /// 启动提示词订阅：启动时合成一次，之后每次触发都发起一次独立的合成。
    ///
    /// 后台任务只持有弱引用，`Studio` 被释放后自动结束。
    pub fn spawn_prompt_subscription(self: &Arc<Self>) -> JoinHandle<()> {
        let mut triggers = self.prompt_tx.subscribe();
        triggers.mark_changed();
        let studio = Arc::downgrade(self);

        tokio::spawn(async move {
            while triggers.changed().await.is_ok() {
                let mut inputs = triggers.borrow_and_update().clone();
                let Some(studio) = studio.upgrade() else {
                    break;
                };
                if inputs.seq == 0 {
                    inputs.seq = studio.state().next_seq();
                }
                tokio::spawn(async move {
                    // 错误已经写入横幅
                    let _ = studio.synthesize_for(inputs).await;
                });
            }
            log::debug!("提示词订阅已结束");
        })
    }

    /// 立即按当前设置合成一次提示词，返回合成后当前生效的提示词。
    pub async fn synthesize_prompt_now(&self) -> Result<String, AppError> {
        let inputs = self.state().prompt_inputs();
        self.synthesize_for(inputs).await?;
        Ok(self.prompt())
    }

    /// 执行一次合成。结果过期时返回 `Ok(None)`，不改动已有提示词。
    pub async fn synthesize_for(&self, inputs: PromptInputs) -> Result<Option<String>, AppError> {
        let result = self
            .client
            .synthesize_prompt(&inputs.settings, inputs.style_image.as_ref())
            .await;
        self.apply_prompt_result(inputs.seq, result)
    }

    fn apply_prompt_result(
        &self,
        seq: u64,
        result: Result<String, GenerationError>,
    ) -> Result<Option<String>, AppError> {
        let mut state = self.state();
        if seq <= state.applied_seq {
            log::warn!(
                "⚠️ 丢弃过期的提示词结果 - 序号: {} 已应用: {}",
                seq,
                state.applied_seq
            );
            return Ok(None);
        }
        state.applied_seq = seq;

        match result {
            Ok(prompt) => {
                state.prompt = prompt.clone();
                Ok(Some(prompt))
            }
            Err(e) => {
                drop(state);
                Err(self.record_error(e.into()))
            }
        }
    }

    // ------------------------------------------------------------------
    // 生成与下载
    // ------------------------------------------------------------------

    /// 以当前产品图、提示词与风格参考图生成新图。同一时刻最多一个生成请求在途。
    pub async fn generate(&self) -> Result<EncodedImage, AppError> {
        let Some(_guard) = InFlightGuard::try_acquire(&self.generate_in_flight) else {
            return Err(self.record_error(AppError::Busy("图片生成")));
        };

        let (product, prompt, style) = {
            let state = self.state();
            (
                state.product_image.clone(),
                state.prompt.trim().to_string(),
                state.style_image.clone(),
            )
        };
        let Some(product) = product else {
            return Err(self.record_error(AppError::MissingInput("产品图片")));
        };
        if prompt.is_empty() {
            return Err(self.record_error(AppError::MissingInput("提示词")));
        }

        log::info!(
            "🚀 开始生成 - 产品图: {} bytes 风格参考图: {}",
            product.len(),
            style.is_some()
        );
        match self.client.edit_image(&product, &prompt, style.as_ref()).await {
            Ok(image) => {
                self.state().generated = Some(image.clone());
                Ok(image)
            }
            Err(e) => Err(self.record_error(e.into())),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generate_in_flight.load(Ordering::SeqCst)
    }

    /// 当前生成结果的下载表示。
    pub fn download(&self) -> Result<Download, AppError> {
        self.generated_image()
            .map(|image| Download::from_image(&image))
            .ok_or(AppError::MissingInput("生成结果"))
            .map_err(|e| self.record_error(e))
    }

    /// 把当前生成结果写入 `dir`，返回文件路径。
    pub fn save_download(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let image = self
            .generated_image()
            .ok_or(AppError::MissingInput("生成结果"))
            .map_err(|e| self.record_error(e))?;
        write_download(dir, &image).map_err(|e| self.record_error(e))
    }

    // ------------------------------------------------------------------
    // 只读访问与错误横幅
    // ------------------------------------------------------------------

    pub fn settings(&self) -> StyleSettings {
        self.state().settings
    }

    pub fn prompt(&self) -> String {
        self.state().prompt.clone()
    }

    pub fn product_image(&self) -> Option<EncodedImage> {
        self.state().product_image.clone()
    }

    pub fn style_image(&self) -> Option<EncodedImage> {
        self.state().style_image.clone()
    }

    pub fn generated_image(&self) -> Option<EncodedImage> {
        self.state().generated.clone()
    }

    pub fn error_banner(&self) -> Option<ErrorBanner> {
        self.state().banner.clone()
    }

    pub fn dismiss_error(&self) {
        self.state().banner = None;
    }
}
