use dupscan::config::{Config, ProgressConfig};
use figment::providers::Serialized;
use figment::{Figment, Jail};
use std::path::Path;

#[test]
fn test_config_defaults_extract() {
    // Defaults alone, so the environment cannot interfere
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.progress, ProgressConfig::default());
}

#[test]
fn test_config_layers_in_order() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "layers.toml",
            r#"
                prehash_size = 1024
                skip_empty_files = false
                event_channel_capacity = 64
            "#,
        )?;
        jail.set_env("DUPSCAN_EVENT_CHANNEL_CAPACITY", "128");

        let config: Config = Config::figment(Some(Path::new("layers.toml"))).extract()?;
        assert_eq!(config.prehash_size, 1024);
        assert!(!config.skip_empty_files);
        assert_eq!(config.event_channel_capacity, 128);
        assert!(!config.report_empty_dirs);
        Ok(())
    });
}

#[test]
fn test_config_nested_env_key() {
    Jail::expect_with(|jail| {
        jail.set_env("DUPSCAN_PROGRESS__TICK_MS", "500");
        jail.set_env("DUPSCAN_REPORT_EMPTY_DIRS", "true");

        let config: Config = Config::figment(None).extract()?;
        assert_eq!(config.progress.tick_ms, 500);
        assert!(config.progress.enabled);
        assert!(config.report_empty_dirs);
        Ok(())
    });
}

#[test]
fn test_unknown_keys_ignored() {
    Jail::expect_with(|jail| {
        jail.create_file("extra.toml", "future_option = 3\nprehash_size = 2048")?;
        let config: Config = Config::figment(Some(Path::new("extra.toml"))).extract()?;
        assert_eq!(config.prehash_size, 2048);
        Ok(())
    });
}

#[cfg(target_os = "linux")]
#[test]
fn test_default_path_file_is_picked_up() {
    Jail::expect_with(|jail| {
        let config_home = jail.directory().join("xdg");
        std::fs::create_dir_all(config_home.join("dupscan")).map_err(|e| e.to_string())?;
        std::fs::write(config_home.join("dupscan/config.toml"), "report_empty_dirs = true")
            .map_err(|e| e.to_string())?;
        jail.set_env("XDG_CONFIG_HOME", config_home.display());

        let path = Config::default_path().expect("config dir");
        assert_eq!(path, config_home.join("dupscan/config.toml"));

        let config = Config::load(None).map_err(|e| e.to_string())?;
        assert!(config.report_empty_dirs);
        Ok(())
    });
}

#[test]
fn test_engine_config_from_config() {
    let config = Config {
        prehash_size: 64,
        skip_empty_files: false,
        ..Config::default()
    };
    let engine = config.engine_config();
    assert_eq!(engine.prehash_size, 64);
    assert!(!engine.skip_empty_files);
}
