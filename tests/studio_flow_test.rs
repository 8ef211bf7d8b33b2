use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ai_photo_studio::codec::{EncodedImage, ImageMime};
use ai_photo_studio::config::StudioConfig;
use ai_photo_studio::error::AppError;
use ai_photo_studio::generation::{GenerationClient, GenerationError};
use ai_photo_studio::studio::{DOWNLOAD_FILENAME, Studio};
use ai_photo_studio::style::{AspectRatio, StyleSettings};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use tokio::sync::Notify;

#[derive(Default)]
struct FakeClient {
    prompt_calls: AtomicUsize,
    edit_calls: AtomicUsize,
    prompt_error: Option<GenerationError>,
    slow_aspect: Option<AspectRatio>,
    edit_results: Mutex<VecDeque<Result<EncodedImage, GenerationError>>>,
    gate: Option<Arc<Notify>>,
}

impl FakeClient {
    fn with_edit_results(results: Vec<Result<EncodedImage, GenerationError>>) -> Self {
        Self {
            edit_results: Mutex::new(results.into()),
            ..Self::default()
        }
    }
}

impl GenerationClient for FakeClient {
    async fn synthesize_prompt(
        &self,
        settings: &StyleSettings,
        style_image: Option<&EncodedImage>,
    ) -> Result<String, GenerationError> {
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        if Some(settings.aspect_ratio) == self.slow_aspect {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if let Some(err) = &self.prompt_error {
            return Err(err.clone());
        }
        Ok(format!(
            "prompt for {} {} (style: {})",
            settings.aspect_ratio,
            settings.lighting,
            style_image.is_some()
        ))
    }

    async fn edit_image(
        &self,
        _product_image: &EncodedImage,
        _prompt: &str,
        _style_image: Option<&EncodedImage>,
    ) -> Result<EncodedImage, GenerationError> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.edit_results.lock().expect("results lock").pop_front();
        next.unwrap_or_else(|| Ok(result_image(b"default")))
    }
}

fn result_image(tag: &[u8]) -> EncodedImage {
    let mut payload = b"\x89PNG\r\n\x1a\n".to_vec();
    payload.extend_from_slice(tag);
    EncodedImage::new(payload, ImageMime::Png)
}

fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

fn unique_temp_dir() -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("ai-photo-studio-flow-test-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn studio_with(client: FakeClient) -> Studio<FakeClient> {
    Studio::new(StudioConfig::with_api_key("test-key"), client)
}

async fn studio_with_product(client: FakeClient) -> Studio<FakeClient> {
    let studio = studio_with(client);
    let session = studio
        .upload_product(create_png_bytes(200, 100), "image/png")
        .await
        .expect("upload");
    studio.save_crop(session, None).await.expect("save crop");
    studio
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn upload_crop_generate_download() {
    let studio = studio_with_product(FakeClient::default()).await;

    let product = studio.product_image().expect("product image");
    assert_eq!(product.mime(), ImageMime::Png);
    let cropped = image::load_from_memory(product.payload()).expect("decode crop");
    assert_eq!((cropped.width(), cropped.height()), (90, 90));

    studio.set_prompt("a bottle on marble");
    let generated = studio.generate().await.expect("generate");
    assert_eq!(studio.generated_image(), Some(generated.clone()));

    let download = studio.download().expect("download");
    assert_eq!(download.filename, DOWNLOAD_FILENAME);
    assert_eq!(download.data_uri, generated.to_data_uri());
    assert!(download.data_uri.starts_with("data:image/png;base64,"));

    let dir = unique_temp_dir();
    let path = studio.save_download(&dir).expect("save download");
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("ai-photo-studio-result.png"));
    assert_eq!(std::fs::read(&path).expect("read"), generated.payload().to_vec());
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn no_image_returned_keeps_previous_result() {
    let client = FakeClient::with_edit_results(vec![
        Ok(result_image(b"first")),
        Err(GenerationError::NoImageReturned),
    ]);
    let studio = studio_with_product(client).await;
    studio.set_prompt("studio shot");

    let first = studio.generate().await.expect("first generate");
    let err = studio.generate().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Generation(GenerationError::NoImageReturned)
    ));
    assert_eq!(studio.generated_image(), Some(first));
    assert_eq!(studio.prompt(), "studio shot");

    let banner = studio.error_banner().expect("banner");
    assert_eq!(banner.code, "no_image_returned");
    assert_eq!(banner.stage, "generate");

    studio.dismiss_error();
    assert!(studio.error_banner().is_none());
}

#[tokio::test]
async fn generate_requires_product_and_prompt() {
    let studio = studio_with(FakeClient::default());
    studio.set_prompt("anything");
    assert!(matches!(
        studio.generate().await,
        Err(AppError::MissingInput("产品图片"))
    ));

    let studio = studio_with_product(FakeClient::default()).await;
    studio.set_prompt("   ");
    assert!(matches!(
        studio.generate().await,
        Err(AppError::MissingInput("提示词"))
    ));
    assert_eq!(studio.client().edit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_generation_while_in_flight_is_busy() {
    let gate = Arc::new(Notify::new());
    let client = FakeClient {
        gate: Some(Arc::clone(&gate)),
        ..FakeClient::default()
    };
    let studio = Arc::new(studio_with_product(client).await);
    studio.set_prompt("studio shot");

    let first = {
        let studio = Arc::clone(&studio);
        tokio::spawn(async move { studio.generate().await })
    };
    wait_until(|| studio.client().edit_calls.load(Ordering::SeqCst) == 1).await;
    assert!(studio.is_generating());

    let busy = studio.generate().await;
    assert!(matches!(busy, Err(AppError::Busy(_))));

    gate.notify_one();
    first.await.expect("join").expect("first generate");
    assert!(!studio.is_generating());
    assert_eq!(studio.client().edit_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_prompt_completion_is_discarded() {
    let client = FakeClient {
        slow_aspect: Some(AspectRatio::Landscape),
        ..FakeClient::default()
    };
    let studio = studio_with(client);
    let mut triggers = studio.subscribe_prompt_triggers();

    studio.set_settings(StyleSettings::default().with_aspect_ratio(AspectRatio::Landscape));
    let older = triggers.borrow_and_update().clone();
    studio.set_settings(StyleSettings::default().with_aspect_ratio(AspectRatio::Portrait));
    let newer = triggers.borrow_and_update().clone();
    assert!(newer.seq > older.seq);

    let (older_result, newer_result) =
        tokio::join!(studio.synthesize_for(older), studio.synthesize_for(newer));

    assert_eq!(older_result.expect("older"), None);
    assert!(newer_result.expect("newer").is_some());
    assert!(studio.prompt().starts_with("prompt for 3:4"));
}

#[tokio::test]
async fn subscription_resynthesizes_on_settings_change() {
    let studio = Arc::new(studio_with(FakeClient::default()));
    let subscription = studio.spawn_prompt_subscription();

    wait_until(|| studio.prompt().starts_with("prompt for 1:1")).await;

    studio.set_settings(StyleSettings::default().with_aspect_ratio(AspectRatio::Landscape));
    wait_until(|| studio.prompt().starts_with("prompt for 16:9")).await;

    studio
        .upload_style(vec![0xff, 0xd8, 0xff, 0xe0], "image/jpeg")
        .expect("style");
    wait_until(|| studio.prompt().ends_with("(style: true)")).await;

    assert_eq!(studio.client().prompt_calls.load(Ordering::SeqCst), 3);
    subscription.abort();
}

#[tokio::test]
async fn failed_prompt_synthesis_keeps_manual_prompt() {
    let client = FakeClient {
        prompt_error: Some(GenerationError::RateLimited("quota".to_string())),
        ..FakeClient::default()
    };
    let studio = studio_with(client);
    studio.set_prompt("manual prompt");

    let err = studio.synthesize_prompt_now().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Generation(GenerationError::RateLimited(_))
    ));
    assert_eq!(studio.prompt(), "manual prompt");
    assert_eq!(studio.error_banner().map(|b| b.code), Some("rate_limited"));
}

#[tokio::test]
async fn oversized_product_upload_sets_banner() {
    let studio = studio_with(FakeClient::default());

    let result = studio
        .upload_product(vec![0u8; 15 * 1024 * 1024], "image/jpeg")
        .await;

    assert!(matches!(result, Err(AppError::Codec(_))));
    assert!(studio.product_image().is_none());
    let banner = studio.error_banner().expect("banner");
    assert_eq!(banner.code, "file_too_large");
    assert!(banner.message.contains("15.00 MB"));
}
