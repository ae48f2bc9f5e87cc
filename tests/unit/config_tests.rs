// Configuration loading tests against the shipped example file

use imgwelcome::banner::GuildBannerConfigStore;
use imgwelcome::config::Config;
use std::path::PathBuf;

fn example_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.example.yaml")
}

#[test]
fn test_example_config_loads_and_validates() {
    let config = Config::from_file(example_path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.render.avatar_timeout_secs, 20);
    assert_eq!(
        config.render.default_background,
        Some(PathBuf::from("assets/imgwelcome/transparent.png"))
    );
    assert!(!config.guilds.is_empty());
}

#[test]
fn test_example_config_store_matches_guilds() {
    let config = Config::from_file(example_path()).unwrap();
    let store = config.banner_store();

    for guild in &config.guilds {
        assert_eq!(store.is_enabled(guild.guild_id), guild.enabled);
        assert_eq!(
            store.custom_background_path(guild.guild_id).is_some(),
            guild.has_custom_background
        );
    }
}

#[test]
fn test_bundled_default_template_is_transparent_canvas() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/imgwelcome/transparent.png");
    let template = image::open(path).unwrap().to_rgba8();
    assert_eq!(template.dimensions(), (500, 150));
    assert!(template.pixels().all(|p| p[3] == 0));
}

#[test]
fn test_render_config_builds_text_engine() {
    let config = Config::from_yaml_with_env("render:\n  font_path: null\n").unwrap();
    assert!(config.render.text_engine().is_ok());

    let config =
        Config::from_yaml_with_env("render:\n  font_path: \"/nonexistent/face.ttf\"\n").unwrap();
    assert!(config.render.text_engine().is_err());
}
