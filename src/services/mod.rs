pub mod geoip;
pub mod refresh;

pub use geoip::{DatasetHandle, DatasetRegistry, GeoRecord, GeoResolver};
pub use refresh::RefreshService;
