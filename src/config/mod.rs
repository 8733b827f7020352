//! 配置管理
//!
//! 所有配置通过环境变量加载（支持 .env 文件），启动后只读。
//! `get_config()` 返回的 Arc 指针可以廉价克隆，不持有任何锁。

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use std::{env, str::FromStr};

use arc_swap::ArcSwap;

/// ASN 数据集文件名（固定约定，下载时原子覆盖）
pub const ASN_DB_FILE: &str = "GeoLite2-ASN.mmdb";
/// City 数据集文件名
pub const CITY_DB_FILE: &str = "GeoLite2-City.mmdb";
/// GeoCN 数据集文件名
pub const CN_DB_FILE: &str = "GeoCN.mmdb";

const DEFAULT_ASN_DB_URL: &str =
    "https://github.com/P3TERX/GeoLite.mmdb/raw/download/GeoLite2-ASN.mmdb";
const DEFAULT_CITY_DB_URL: &str =
    "https://github.com/P3TERX/GeoLite.mmdb/raw/download/GeoLite2-City.mmdb";
const DEFAULT_CN_DB_URL: &str =
    "https://github.com/ljxi/GeoCN/releases/download/Latest/GeoCN.mmdb";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub datasets: DatasetConfig,
    pub refresh: RefreshConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// API_SECRET 支持逗号分隔的多个密钥；为空则 API 完全开放
    pub api_secrets: Vec<String>,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.api_secrets.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub asn_url: String,
    pub city_url: String,
    /// 置空可以禁用 GeoCN 数据集
    pub cn_url: String,
}

impl DatasetConfig {
    pub fn asn_path(&self) -> PathBuf {
        self.data_dir.join(ASN_DB_FILE)
    }

    pub fn city_path(&self) -> PathBuf {
        self.data_dir.join(CITY_DB_FILE)
    }

    pub fn cn_path(&self) -> PathBuf {
        self.data_dir.join(CN_DB_FILE)
    }

    pub fn cn_enabled(&self) -> bool {
        !self.cn_url.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub download_timeout: Duration,
    /// 固定间隔（小时）；未设置时按每周日 23:59:59 (UTC) 刷新
    pub interval_hours: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub seconds_per_request: u64,
    pub burst: u32,
}

impl AppConfig {
    /// 从环境变量加载配置，缺省值与原服务保持一致
    pub fn from_env() -> Self {
        AppConfig {
            server: ServerConfig {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parse("PORT", 7099),
            },
            auth: AuthConfig {
                api_secrets: env::var("API_SECRET")
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            },
            datasets: DatasetConfig {
                data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
                asn_url: env_or("ASN_DB_URL", DEFAULT_ASN_DB_URL),
                city_url: env_or("CITY_DB_URL", DEFAULT_CITY_DB_URL),
                cn_url: env_or("CN_DB_URL", DEFAULT_CN_DB_URL),
            },
            refresh: RefreshConfig {
                download_timeout: Duration::from_secs(env_parse("DOWNLOAD_TIMEOUT_SECS", 300)),
                interval_hours: env::var("REFRESH_INTERVAL_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            rate_limit: RateLimitConfig {
                seconds_per_request: env_parse("RATE_LIMIT_SECONDS_PER_REQUEST", 1),
                burst: env_parse("RATE_LIMIT_BURST", 120),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

static CONFIG: OnceLock<ArcSwap<AppConfig>> = OnceLock::new();

/// Initialize the global configuration from the current environment.
///
/// Safe to call multiple times; only the first call loads.
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(AppConfig::from_env()));
}

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<AppConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(AppConfig::from_env()))
        .load_full()
}
