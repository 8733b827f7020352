//! 环境变量配置加载测试
//!
//! 环境变量是进程级状态，所有用例通过同一把锁串行执行。

use std::sync::Mutex;
use std::time::Duration;

use ipregion::config::{AppConfig, ASN_DB_FILE, CITY_DB_FILE, CN_DB_FILE};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SERVER_HOST",
        "PORT",
        "API_SECRET",
        "DATA_DIR",
        "ASN_DB_URL",
        "CITY_DB_URL",
        "CN_DB_URL",
        "DOWNLOAD_TIMEOUT_SECS",
        "REFRESH_INTERVAL_HOURS",
        "RATE_LIMIT_SECONDS_PER_REQUEST",
        "RATE_LIMIT_BURST",
    ] {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn test_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let config = AppConfig::from_env();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 7099);
    assert!(!config.auth.enabled());
    assert!(config.datasets.cn_enabled());
    assert_eq!(config.refresh.download_timeout, Duration::from_secs(300));
    assert!(config.refresh.interval_hours.is_none());
    assert_eq!(config.rate_limit.burst, 120);
}

#[test]
fn test_dataset_paths_use_fixed_names() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    unsafe { std::env::set_var("DATA_DIR", "/var/lib/ipregion") };

    let config = AppConfig::from_env();

    assert_eq!(
        config.datasets.asn_path(),
        std::path::Path::new("/var/lib/ipregion").join(ASN_DB_FILE)
    );
    assert_eq!(
        config.datasets.city_path(),
        std::path::Path::new("/var/lib/ipregion").join(CITY_DB_FILE)
    );
    assert_eq!(
        config.datasets.cn_path(),
        std::path::Path::new("/var/lib/ipregion").join(CN_DB_FILE)
    );
}

#[test]
fn test_api_secret_list_parsing() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    unsafe { std::env::set_var("API_SECRET", "alpha, beta,,gamma ") };

    let config = AppConfig::from_env();

    assert!(config.auth.enabled());
    assert_eq!(config.auth.api_secrets, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_overrides_and_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    unsafe {
        std::env::set_var("PORT", "8088");
        std::env::set_var("REFRESH_INTERVAL_HOURS", "12");
        std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "not-a-number");
        std::env::set_var("CN_DB_URL", "");
    }

    let config = AppConfig::from_env();

    assert_eq!(config.server.port, 8088);
    assert_eq!(config.refresh.interval_hours, Some(12));
    // 解析失败时落回默认值
    assert_eq!(config.refresh.download_timeout, Duration::from_secs(300));
    // 置空 URL 禁用 GeoCN 数据集
    assert!(!config.datasets.cn_enabled());
}
