//! 数据集刷新调度
//!
//! 按计划（默认每周日深夜，可配置为固定间隔）下载三个数据集文件，
//! 全部就绪后打开成新句柄并一次性安装进注册表。下载和打开都在
//! 阻塞线程池中进行，服务路径只承担最后那一次原子替换。
//!
//! 刷新失败从不影响正在服务的快照：临时文件被丢弃、记一条日志，
//! 下个周期重试。`in_flight` 标志保证同一时刻至多一次刷新在进行，
//! 外部触发与定时触发并发时后来者直接跳过。

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, Utc};
use tracing::{error, info, warn};
use ureq::Agent;

use crate::config::{AppConfig, RefreshConfig, get_config};
use crate::errors::{IpRegionError, Result};
use crate::services::geoip::{DatasetHandle, DatasetRegistry};

pub struct RefreshService {
    registry: Arc<DatasetRegistry>,
    in_flight: AtomicBool,
}

impl RefreshService {
    pub fn new(registry: Arc<DatasetRegistry>) -> Self {
        RefreshService {
            registry,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 执行一轮刷新。已有刷新在进行时直接返回 `Ok(None)`，
    /// 成功时返回新快照的代号。
    pub async fn refresh_once(&self) -> Result<Option<u64>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Dataset refresh already in progress, skipping");
            return Ok(None);
        }
        let result = self.refresh_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    async fn refresh_inner(&self) -> Result<u64> {
        let config = get_config();
        info!("Refreshing datasets into {}", config.datasets.data_dir.display());
        let (asn, city, cn) = tokio::task::spawn_blocking(move || fetch_and_open(&config))
            .await
            .map_err(|e| IpRegionError::fetch(format!("refresh task failed: {e}")))??;
        let generation = self.registry.install(asn, city, cn);
        info!("Installed dataset snapshot generation {}", generation);
        Ok(generation)
    }

    /// 直接打开本地已有的数据集文件并安装，不做下载。
    /// 用于启动时在首次刷新前恢复服务。
    pub fn load_local(&self) -> Result<u64> {
        let config = get_config();
        let datasets = &config.datasets;
        let asn = Arc::new(DatasetHandle::open(datasets.asn_path())?);
        let city = Arc::new(DatasetHandle::open(datasets.city_path())?);
        let cn = if datasets.cn_enabled() {
            match DatasetHandle::open(datasets.cn_path()) {
                Ok(handle) => Some(Arc::new(handle)),
                Err(e) => {
                    warn!("GeoCN dataset unavailable locally: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let generation = self.registry.install(Some(asn), Some(city), cn);
        info!("Loaded local datasets as generation {}", generation);
        Ok(generation)
    }

    /// 后台调度循环：启动时先尝试本地文件，失败则立即刷新，
    /// 之后按计划周期性刷新。进程退出不等待进行中的刷新。
    pub fn spawn_scheduler(self: Arc<Self>) {
        tokio::spawn(async move {
            let service = self.clone();
            let loaded = tokio::task::spawn_blocking(move || service.load_local())
                .await
                .unwrap_or_else(|e| Err(IpRegionError::file_operation(e.to_string())));
            if let Err(e) = loaded {
                warn!("No usable local datasets ({}), fetching now", e);
                if let Err(e) = self.refresh_once().await {
                    error!("Initial dataset refresh failed: {}", e);
                }
            }

            loop {
                let config = get_config();
                let wait = next_refresh_delay(&config.refresh, Utc::now());
                info!("Next dataset refresh in {:?}", wait);
                tokio::time::sleep(wait).await;
                if let Err(e) = self.refresh_once().await {
                    error!("Scheduled dataset refresh failed: {}", e);
                }
            }
        });
    }
}

/// 下载并打开全部配置的数据集。任何一个失败都放弃整轮刷新。
fn fetch_and_open(
    config: &AppConfig,
) -> Result<(
    Option<Arc<DatasetHandle>>,
    Option<Arc<DatasetHandle>>,
    Option<Arc<DatasetHandle>>,
)> {
    let datasets = &config.datasets;
    fs::create_dir_all(&datasets.data_dir)?;

    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(config.refresh.download_timeout))
        .build()
        .into();

    download_dataset(&agent, &datasets.asn_url, &datasets.asn_path())?;
    download_dataset(&agent, &datasets.city_url, &datasets.city_path())?;
    if datasets.cn_enabled() {
        download_dataset(&agent, &datasets.cn_url, &datasets.cn_path())?;
    }

    let asn = Some(Arc::new(DatasetHandle::open(datasets.asn_path())?));
    let city = Some(Arc::new(DatasetHandle::open(datasets.city_path())?));
    let cn = if datasets.cn_enabled() {
        Some(Arc::new(DatasetHandle::open(datasets.cn_path())?))
    } else {
        None
    };
    Ok((asn, city, cn))
}

/// 下载到临时文件，成功后原子重命名覆盖目标。
/// 并发打开目标文件的一方永远不会读到半写状态。
fn download_dataset(agent: &Agent, url: &str, target: &Path) -> Result<()> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset");
    info!("Downloading {} from {}", file_name, url);

    let tmp = target.with_extension("mmdb.download");
    let result = (|| -> Result<u64> {
        let response = agent.get(url).call()?;
        let mut reader = response.into_body().into_reader();
        let mut file = fs::File::create(&tmp)?;
        let written = io::copy(&mut reader, &mut file)?;
        Ok(written)
    })();

    match result {
        Ok(written) => {
            fs::rename(&tmp, target)?;
            info!("Downloaded {} ({} bytes)", file_name, written);
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            warn!("Download of {} failed: {}", file_name, e);
            Err(e)
        }
    }
}

/// 距下一次计划刷新的等待时长
pub fn next_refresh_delay(config: &RefreshConfig, now: DateTime<Utc>) -> Duration {
    if let Some(hours) = config.interval_hours {
        return Duration::from_secs(hours.saturating_mul(3600));
    }
    let next = next_sunday_last_second(now);
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// 下一个周日 23:59:59 (UTC)。今天已是周日则推到下周。
pub fn next_sunday_last_second(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_until_sunday = (7 - now.weekday().num_days_from_sunday()) % 7;
    let days_until_sunday = if days_until_sunday == 0 {
        7
    } else {
        days_until_sunday
    };
    (now.date_naive() + Days::new(u64::from(days_until_sunday)))
        .and_hms_opt(23, 59, 59)
        .expect("valid wall clock time")
        .and_utc()
}
