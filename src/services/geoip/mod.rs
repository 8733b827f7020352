//! GeoIP 核心模块
//!
//! - `dataset`: 单个数据集句柄
//! - `registry`: 当前生效句柄集合的原子快照
//! - `resolver`: 多数据集合并解析
//! - `record`: 原始记录与输出模型

pub mod dataset;
pub mod record;
pub mod registry;
pub mod resolver;

pub use dataset::DatasetHandle;
pub use record::{AsInfo, GeoRecord};
pub use registry::{DatasetRegistry, DatasetSnapshot};
pub use resolver::GeoResolver;
