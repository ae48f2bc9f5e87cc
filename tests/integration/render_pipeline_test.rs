// End-to-end banner renders: config snapshot → background → avatar → PNG

use super::avatar_server::{self, solid_png, Behavior};
use image::{DynamicImage, Rgba, RgbaImage};
use imgwelcome::banner::{
    encode_png, BackgroundResolver, BannerConfig, BannerOutput, BannerRenderer, HttpAvatarFetcher,
    MemberJoinEvent, RenderOutcome, RenderStage, SnapshotStore, TextLayout, TextLayoutEngine,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const GUILD: u64 = 1001;
const MEMBER: u64 = 77;

struct Fixture {
    dir: TempDir,
    store: Arc<SnapshotStore>,
    renderer: BannerRenderer,
}

fn fixture(config: BannerConfig) -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SnapshotStore::new(dir.path()));
    store.upsert(config);

    let renderer = BannerRenderer::new(
        store.clone(),
        Arc::new(HttpAvatarFetcher::new().unwrap()),
        TextLayoutEngine::embedded().unwrap(),
    )
    .with_avatar_timeout(Duration::from_secs(5));

    Fixture {
        dir,
        store,
        renderer,
    }
}

fn join(avatar_url: &str) -> MemberJoinEvent {
    MemberJoinEvent::new(GUILD, MEMBER, avatar_url, "Bob", "0001", "Acme")
}

fn enabled() -> BannerConfig {
    BannerConfig::new(GUILD)
        .with_enabled(true)
        .with_greeting("Hey user, welcome to server!")
        .with_welcome_channel(42)
}

/// Diagonal gradient so every pixel differs from its neighbours
fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

#[tokio::test]
async fn test_acme_bob_scenario_renders_image() {
    let server =
        avatar_server::spawn(Behavior::Body(solid_png(96, 96, [220, 30, 30, 255]))).await;
    let fx = fixture(enabled());

    let message = fx.renderer.render(&join(&server.url())).await;

    assert_eq!(message.outcome, RenderOutcome::Success);
    assert_eq!(message.channel_id, Some(42));
    assert_eq!(message.output.caption(), "Hey <@77>, welcome to Acme!");

    let png = message.output.image().expect("image output");
    let decoded = image::load_from_memory(png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (500, 150));

    // Center of the avatar circle shows the avatar
    let center = decoded.get_pixel(75, 75);
    assert!(center[0] > 180 && center[1] < 80 && center[3] == 255);

    // Far corner of a transparent template stays transparent
    assert_eq!(decoded.get_pixel(499, 0)[3], 0);

    let layout = TextLayout::new("Bob", "0001", "Acme");
    assert_eq!(layout.heading.text(), "Welcome");
    assert_eq!(layout.name.text(), "Bob#0001");
    assert_eq!(layout.tier.font_size, 30.0);
    assert_eq!(layout.server_line.text(), "Welcome to Acme!");

    assert_eq!(server.hits(), 1);
    assert_eq!(fx.renderer.metrics().rendered(), 1);
}

#[tokio::test]
async fn test_disabled_guild_gets_text_without_fetch() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(8, 8, [0, 0, 0, 255]))).await;
    let fx = fixture(enabled().with_enabled(false));

    let message = fx.renderer.render(&join(&server.url())).await;

    assert_eq!(message.outcome, RenderOutcome::Disabled);
    assert_eq!(
        message.output,
        BannerOutput::Text {
            caption: "Hey <@77>, welcome to Acme!".to_string()
        }
    );
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_avatar_404_degrades_to_caption() {
    let server = avatar_server::spawn(Behavior::Status(404)).await;
    let fx = fixture(enabled());

    let message = fx.renderer.render(&join(&server.url())).await;

    assert!(message.output.image().is_none());
    assert_eq!(message.output.caption(), "Hey <@77>, welcome to Acme!");
    assert_eq!(
        message.outcome,
        RenderOutcome::Failure {
            stage: RenderStage::FetchAvatar,
            reason: "fetch_http_error",
        }
    );
    assert_eq!(fx.renderer.metrics().fallback_count("fetch_http_error"), 1);
    assert_eq!(fx.renderer.metrics().fetch_failure_count("http"), 1);
}

#[tokio::test]
async fn test_avatar_timeout_degrades_to_caption() {
    let server = avatar_server::spawn(Behavior::Slow(
        Duration::from_secs(10),
        solid_png(8, 8, [0, 0, 0, 255]),
    ))
    .await;
    let fx = fixture(enabled());
    let renderer = fx
        .renderer
        .clone()
        .with_avatar_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let message = renderer.render(&join(&server.url())).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!message.output.is_image());
    assert_eq!(
        message.outcome,
        RenderOutcome::Failure {
            stage: RenderStage::FetchAvatar,
            reason: "fetch_timeout",
        }
    );
}

#[tokio::test]
async fn test_undecodable_avatar_degrades_to_caption() {
    let server = avatar_server::spawn(Behavior::Body(b"GIF89a-truncated".to_vec())).await;
    let fx = fixture(enabled());

    let message = fx.renderer.render(&join(&server.url())).await;

    assert!(!message.output.is_image());
    assert!(matches!(
        message.outcome,
        RenderOutcome::Failure {
            reason: "fetch_decode_error",
            ..
        }
    ));
}

#[tokio::test]
async fn test_broken_custom_background_still_renders() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(16, 16, [0, 0, 255, 255]))).await;
    let fx = fixture(enabled().with_custom_background(true));
    let path = fx.dir.path().join(format!("{GUILD}.png"));
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n-partial").unwrap();

    let message = fx.renderer.render(&join(&server.url())).await;

    assert_eq!(message.outcome, RenderOutcome::Success);
    assert_eq!(fx.renderer.metrics().background_fallbacks(), 1);
}

#[tokio::test]
async fn test_round_trip_preserves_background_outside_foreground() {
    let fx = fixture(enabled().with_custom_background(true));
    let background = gradient(800, 300);
    let resolver: &BackgroundResolver = fx.renderer.resolver();
    let upload = encode_png(&background).unwrap();
    resolver.install_custom_background(GUILD, &upload).unwrap();

    let resolved = resolver.resolve(GUILD).unwrap();
    let avatar = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        128,
        128,
        Rgba([0, 200, 0, 255]),
    ));
    let layout = TextLayout::new("Bob", "0001", "Acme");

    let composed = fx
        .renderer
        .compose(resolved.layer.clone(), &avatar, &layout)
        .unwrap();
    let png = encode_png(&composed.canvas).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (500, 150));
    let mut checked = 0;
    for (x, y, pixel) in decoded.enumerate_pixels() {
        if composed.is_background_pixel(x, y) {
            assert_eq!(pixel, resolved.layer.get_pixel(x, y), "pixel ({x}, {y})");
            checked += 1;
        }
    }
    // Most of the canvas is still background
    assert!(checked > 500 * 150 / 2);
}

#[tokio::test]
async fn test_concurrent_renders_are_independent() {
    let server =
        avatar_server::spawn(Behavior::Body(solid_png(32, 32, [100, 100, 100, 255]))).await;
    let fx = fixture(enabled());
    let renderer = Arc::new(fx.renderer.clone());

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let mut event = join(&server.url());
            event.member_id = 100 + i;
            event.username = format!("member-{i}-with-a-long-name");
            renderer.spawn_render(event)
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let message = handle.await.unwrap();
        assert_eq!(message.outcome, RenderOutcome::Success);
        assert_eq!(message.member_id, 100 + i as u64);
        assert!(message.output.caption().contains(&format!("<@{}>", 100 + i)));
    }
    assert_eq!(server.hits(), 6);
    assert_eq!(renderer.metrics().rendered(), 6);
}

#[tokio::test]
async fn test_config_update_applies_to_next_render() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(8, 8, [5, 5, 5, 255]))).await;
    let fx = fixture(enabled());

    let first = fx.renderer.render(&join(&server.url())).await;
    assert_eq!(first.outcome, RenderOutcome::Success);

    fx.store.upsert(enabled().with_enabled(false).with_greeting(""));
    let second = fx.renderer.render(&join(&server.url())).await;

    assert_eq!(second.outcome, RenderOutcome::Disabled);
    assert_eq!(second.output.caption(), "Welcome Bob to Acme!");
    assert_eq!(server.hits(), 1);
}
