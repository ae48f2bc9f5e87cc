// Dispatcher hand-off: bounded queue, per-render tasks, channel gating

use super::avatar_server::{self, solid_png, Behavior};
use async_trait::async_trait;
use imgwelcome::banner::{
    BannerConfig, BannerError, BannerRenderer, DispatchError, HttpAvatarFetcher, MemberJoinEvent,
    SnapshotStore, TextLayoutEngine, WelcomeDispatcher, WelcomeMessage, WelcomeSink,
};
use imgwelcome::config::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<(u64, WelcomeMessage)>>,
}

#[async_trait]
impl WelcomeSink for RecordingSink {
    async fn deliver(&self, channel_id: u64, message: &WelcomeMessage) -> Result<(), BannerError> {
        self.messages.lock().push((channel_id, message.clone()));
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl WelcomeSink for FailingSink {
    async fn deliver(&self, _channel_id: u64, _message: &WelcomeMessage) -> Result<(), BannerError> {
        Err(BannerError::Delivery("missing permissions".to_string()))
    }
}

fn renderer() -> Arc<BannerRenderer> {
    let store = Arc::new(SnapshotStore::new(std::env::temp_dir()));
    store.upsert(
        BannerConfig::new(1)
            .with_enabled(true)
            .with_greeting("Welcome user to server")
            .with_welcome_channel(500),
    );
    store.upsert(BannerConfig::new(2).with_enabled(true));
    Arc::new(
        BannerRenderer::new(
            store,
            Arc::new(HttpAvatarFetcher::new().unwrap()),
            TextLayoutEngine::embedded().unwrap(),
        )
        .with_avatar_timeout(Duration::from_secs(5)),
    )
}

fn join(guild_id: u64, member_id: u64, url: &str) -> MemberJoinEvent {
    MemberJoinEvent::new(guild_id, member_id, url, "Bob", "0001", "Acme")
}

#[tokio::test]
async fn test_banner_delivered_to_welcome_channel() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(32, 32, [1, 2, 3, 255]))).await;
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = WelcomeDispatcher::start(renderer(), sink.clone(), 16);

    dispatcher.dispatch(join(1, 10, &server.url())).unwrap();
    // Guild 2 has no welcome channel
    dispatcher.dispatch(join(2, 11, &server.url())).unwrap();
    dispatcher.shutdown().await;

    let messages = sink.messages.lock();
    assert_eq!(messages.len(), 1);
    let (channel_id, message) = &messages[0];
    assert_eq!(*channel_id, 500);
    assert_eq!(message.member_id, 10);
    assert_eq!(message.output.caption(), "Welcome <@10> to Acme");
    assert!(message.output.is_image());
}

#[tokio::test]
async fn test_full_queue_rejects_without_blocking() {
    let sink = Arc::new(RecordingSink::default());
    let renderer = renderer();
    let metrics = renderer.metrics().clone();
    // The worker task cannot run until this test yields, so the queue stays full
    let dispatcher = WelcomeDispatcher::start(renderer, sink, 1);

    dispatcher
        .dispatch(join(1, 10, "http://127.0.0.1:9/a.png"))
        .unwrap();
    let second = dispatcher.dispatch(join(1, 11, "http://127.0.0.1:9/b.png"));

    assert_eq!(second, Err(DispatchError::QueueFull { guild_id: 1 }));
    assert_eq!(metrics.queue_rejections(), 1);
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_sink_failure_does_not_stop_worker() {
    let server = avatar_server::spawn(Behavior::Status(404)).await;
    let renderer = renderer();
    let metrics = renderer.metrics().clone();
    let dispatcher = WelcomeDispatcher::start(renderer, Arc::new(FailingSink), 4);

    for member in 0..3 {
        dispatcher.dispatch(join(1, member, &server.url())).unwrap();
    }
    dispatcher.shutdown().await;

    assert_eq!(metrics.join_events(), 3);
    assert_eq!(metrics.fallback_count("fetch_http_error"), 3);
}

#[tokio::test]
async fn test_dispatcher_from_config_uses_queue_capacity() {
    let yaml = "render:\n  queue_capacity: 2\n  default_background: null\nguilds:\n  - guild_id: 1\n    enabled: true\n    welcome_channel_id: 500\n";
    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    let store = Arc::new(config.banner_store());
    let renderer = Arc::new(
        config
            .render
            .renderer(store, Arc::new(HttpAvatarFetcher::new().unwrap()))
            .unwrap(),
    );
    let metrics = renderer.metrics().clone();
    let dispatcher = config
        .render
        .start_dispatcher(renderer, Arc::new(RecordingSink::default()));

    // Nothing drains the queue until this test yields
    dispatcher.dispatch(join(1, 10, "http://127.0.0.1:9/a.png")).unwrap();
    dispatcher.dispatch(join(1, 11, "http://127.0.0.1:9/b.png")).unwrap();
    let third = dispatcher.dispatch(join(1, 12, "http://127.0.0.1:9/c.png"));

    assert_eq!(third, Err(DispatchError::QueueFull { guild_id: 1 }));
    assert_eq!(metrics.queue_rejections(), 1);
    dispatcher.shutdown().await;
}
