//! # AI 产品摄影工作室 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ai_photo_studio::codec::{self, ImageMime};
use ai_photo_studio::config::StudioConfig;
use ai_photo_studio::crop::{CropError, CropEvent, CropRegion, CropSession, constrain_to_surface};
use ai_photo_studio::error::{AppError, ErrorBanner};
use ai_photo_studio::generation::GeminiClient;
use ai_photo_studio::studio::Studio;
use ai_photo_studio::style::{AspectRatio, CameraPerspective, LightingStyle, StyleSettings};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ai-photo-studio")]
#[command(version, about = "产品照片裁剪与 AI 棚拍生成")]
struct Cli {
    /// JSON 配置覆盖文件（优先于 STUDIO_CONFIG）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// 风格设置参数。
#[derive(Args, Clone)]
struct StyleArgs {
    /// 画幅比例：1:1 / 3:4 / 16:9
    #[arg(long, default_value = "1:1")]
    aspect: AspectRatio,

    /// 布光风格
    #[arg(long, default_value = "studio-softbox")]
    lighting: LightingStyle,

    /// 机位视角
    #[arg(long, default_value = "eye-level")]
    perspective: CameraPerspective,

    /// 风格参考图
    #[arg(long)]
    style_image: Option<PathBuf>,
}

impl StyleArgs {
    fn settings(&self) -> StyleSettings {
        StyleSettings::new(self.aspect, self.lighting, self.perspective)
    }
}

/// 裁剪交互参数。
#[derive(Args, Clone)]
struct CropArgs {
    /// 上传声明的 MIME 类型，缺省按扩展名推断
    #[arg(long)]
    mime: Option<String>,

    /// 显示坐标下的裁剪框 `x,y,w,h`，会被锁定到目标比例并收敛到边界内
    #[arg(long, value_parser = parse_rect)]
    rect: Option<CropRegion>,

    /// 裁剪面板缩放倍数（1.0 ~ 3.0）
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// 输出格式（jpeg / png / webp），缺省沿用上传类型
    #[arg(long, value_parser = parse_mime)]
    format: Option<ImageMime>,
}

#[derive(Subcommand)]
enum Command {
    /// 解码、计算初始裁剪框、可选调整后编码输出
    Crop {
        input: PathBuf,
        #[arg(long, default_value = "1:1")]
        aspect: AspectRatio,
        #[command(flatten)]
        crop: CropArgs,
        /// 输出文件
        #[arg(long, short)]
        out: PathBuf,
    },
    /// 按风格设置合成提示词并打印
    Prompt {
        #[command(flatten)]
        style: StyleArgs,
    },
    /// 完整流程：上传 → 裁剪 → 提示词 → 生成 → 保存
    Generate {
        input: PathBuf,
        #[command(flatten)]
        style: StyleArgs,
        #[command(flatten)]
        crop: CropArgs,
        /// 手动指定提示词，跳过自动合成
        #[arg(long)]
        prompt: Option<String>,
        /// 结果输出目录
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// 列出所有可选的风格选项
    Options,
}

fn parse_rect(value: &str) -> Result<CropRegion, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("裁剪框必须是 4 个数字: {}", e))?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRegion::pixels(*x, *y, *width, *height)),
        _ => Err(format!("裁剪框需要 x,y,w,h 四个值，实际为 {} 个", parts.len())),
    }
}

fn parse_mime(value: &str) -> Result<ImageMime, String> {
    let value = value.trim();
    let mime = if value.contains('/') {
        value.to_string()
    } else {
        format!("image/{}", value)
    };
    ImageMime::from_mime_str(&mime).map_err(|e| e.to_string())
}

fn declared_mime(input: &Path, explicit: Option<&str>) -> Result<String, AppError> {
    match explicit {
        Some(mime) => Ok(mime.to_string()),
        None => Ok(ImageMime::from_path(input)?.as_str().to_string()),
    }
}

/// 模拟裁剪面板上的用户操作：先缩放，再拖拽。每个操作经 `apply` 交给会话。
fn apply_crop_args(
    session: &mut CropSession,
    args: &CropArgs,
    mut apply: impl FnMut(&mut CropSession, CropEvent) -> Result<(), AppError>,
) -> Result<(), AppError> {
    if args.zoom != 1.0 {
        apply(session, CropEvent::ZoomChanged(args.zoom))?;
    }

    if let Some(rect) = &args.rect {
        let aspect = session.aspect().ok_or(CropError::NotInitialized)?;
        let (width, height) = session.displayed_size().ok_or(CropError::NotInitialized)?;
        let constrained = constrain_to_surface(rect, aspect.ratio(), width, height)
            .ok_or_else(|| CropError::InvalidRegion(format!("{:?}", rect)))?;
        apply(session, CropEvent::UserDrag(constrained))?;
    }
    Ok(())
}

fn run_crop(
    config: &StudioConfig,
    input: &Path,
    aspect: AspectRatio,
    crop: &CropArgs,
    out: &Path,
) -> Result<(), AppError> {
    let declared = declared_mime(input, crop.mime.as_deref())?;
    let bytes = fs::read(input)?;
    let raster = codec::decode(&bytes, &declared, &config.codec)?;

    let mut session = CropSession::with_limits(config.viewport, config.codec.clone());
    session.on_image_load(raster, aspect)?;
    apply_crop_args(&mut session, crop, |s, e| Ok(s.apply(e)?))?;

    let output = crop
        .format
        .or_else(|| ImageMime::from_path(out).ok())
        .or_else(|| session.image().map(|image| image.declared_mime()))
        .unwrap_or(ImageMime::Png);
    let encoded = session.save_as(output)?;

    fs::write(out, encoded.payload())?;
    println!("{} ({} bytes, {})", out.display(), encoded.len(), encoded.mime());
    Ok(())
}

fn open_studio(config_path: Option<&Path>) -> Result<Studio<GeminiClient>, AppError> {
    let config = StudioConfig::load(config_path)?;
    let client = GeminiClient::new(&config)?;
    Ok(Studio::new(config, client))
}

fn apply_style(studio: &Studio<GeminiClient>, style: &StyleArgs) -> Result<(), AppError> {
    studio.set_settings(style.settings());
    if let Some(path) = &style.style_image {
        let mime = ImageMime::from_path(path)?;
        studio.upload_style(fs::read(path)?, mime.as_str())?;
    }
    Ok(())
}

fn print_options() {
    println!("画幅比例 (--aspect):");
    for ratio in AspectRatio::ALL {
        println!("  {:<18} {}", ratio.as_str(), ratio.description());
    }
    println!("布光风格 (--lighting):");
    for lighting in LightingStyle::ALL {
        println!("  {:<18} {}", lighting.as_str(), lighting.description());
    }
    println!("机位视角 (--perspective):");
    for perspective in CameraPerspective::ALL {
        println!("  {:<18} {}", perspective.as_str(), perspective.description());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Crop {
            input,
            aspect,
            crop,
            out,
        } => {
            let config = StudioConfig::load_local(config_path)?;
            run_crop(&config, &input, aspect, &crop, &out)?;
        }
        Command::Prompt { style } => {
            let studio = open_studio(config_path)?;
            apply_style(&studio, &style)?;
            println!("{}", studio.synthesize_prompt_now().await?);
        }
        Command::Generate {
            input,
            style,
            crop,
            prompt,
            out_dir,
        } => {
            let studio = open_studio(config_path)?;
            apply_style(&studio, &style)?;

            let declared = declared_mime(&input, crop.mime.as_deref())?;
            let mut session = studio.upload_product(fs::read(&input)?, &declared).await?;
            apply_crop_args(&mut session, &crop, |s, e| studio.apply_crop_event(s, e))?;
            studio.save_crop(session, crop.format).await?;

            match prompt {
                Some(prompt) => studio.set_prompt(prompt),
                None => {
                    studio.synthesize_prompt_now().await?;
                }
            }
            log::info!("📝 使用提示词: {}", studio.prompt());

            studio.generate().await?;
            let path = studio.save_download(&out_dir)?;
            println!("{}", path.display());
        }
        Command::Options => print_options(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let banner = ErrorBanner::from(&err);
            eprintln!("❌ [{}/{}] {}", banner.stage, banner.code, banner.message);
            ExitCode::FAILURE
        }
    }
}
