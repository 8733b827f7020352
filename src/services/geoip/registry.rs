//! 数据集注册表
//!
//! 持有当前生效的数据集句柄快照，读取方通过一次原子指针加载获得完整
//! 快照，刷新方通过一次原子替换完成安装。进行中的查询继续使用旧快照
//! 直到结束，旧句柄靠 Arc 引用计数在无人引用后释放，替换过程不加锁。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};

use super::dataset::DatasetHandle;

/// 一次原子获取的句柄三元组。单次解析全程使用同一个快照，
/// 不会混用新旧两代句柄。
#[derive(Debug)]
pub struct DatasetSnapshot {
    pub asn: Option<Arc<DatasetHandle>>,
    pub city: Option<Arc<DatasetHandle>>,
    pub cn: Option<Arc<DatasetHandle>>,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DatasetRegistry {
    current: ArcSwapOption<DatasetSnapshot>,
    generation: AtomicU64,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        DatasetRegistry {
            current: ArcSwapOption::const_empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// 获取当前快照。无锁，O(1)，任意数量的并发调用都安全。
    /// 首次成功刷新前返回 `None`。
    pub fn current(&self) -> Option<Arc<DatasetSnapshot>> {
        self.current.load_full()
    }

    /// 原子安装新快照，返回新的代号。
    /// 已经拿到旧快照的读取方不受影响。
    pub fn install(
        &self,
        asn: Option<Arc<DatasetHandle>>,
        city: Option<Arc<DatasetHandle>>,
        cn: Option<Arc<DatasetHandle>>,
    ) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = DatasetSnapshot {
            asn,
            city,
            cn,
            generation,
            loaded_at: Utc::now(),
        };
        self.current.store(Some(Arc::new(snapshot)));
        generation
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }
}
