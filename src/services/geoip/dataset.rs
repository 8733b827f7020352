//! 数据集句柄
//!
//! 封装一个已打开的 MaxMind 格式数据库。句柄构造后只读，以 `Arc` 共享；
//! 最后一个引用释放时才关闭底层缓冲，因此热替换期间进行中的查询
//! 始终安全。

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use maxminddb::{MaxMindDBError, Reader};
use serde::de::DeserializeOwned;

use crate::errors::{IpRegionError, Result};

pub struct DatasetHandle {
    path: PathBuf,
    reader: Reader<Vec<u8>>,
}

impl DatasetHandle {
    /// 打开数据集文件。文件缺失、截断或格式不支持都会返回
    /// `DatasetOpen` 错误，由调用方决定是否放弃本轮刷新。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = Reader::open_readfile(&path).map_err(|e| {
            IpRegionError::dataset_open(format!("{}: {}", path.display(), e))
        })?;
        Ok(DatasetHandle { path, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 点查询。地址不在数据集内返回 `Ok(None)`，这不是错误。
    pub fn lookup<T: DeserializeOwned>(&self, ip: IpAddr) -> Result<Option<T>> {
        match self.reader.lookup::<T>(ip) {
            Ok(record) => Ok(Some(record)),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(IpRegionError::lookup_failure(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// 网段查询，返回记录和命中的 CIDR
    pub fn lookup_network<T: DeserializeOwned>(&self, ip: IpAddr) -> Result<Option<(T, String)>> {
        match self.reader.lookup_prefix::<T>(ip) {
            Ok((record, prefix_len)) => Ok(Some((record, network_string(ip, prefix_len)))),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(IpRegionError::lookup_failure(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl std::fmt::Debug for DatasetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetHandle")
            .field("path", &self.path)
            .finish()
    }
}

/// 将查询地址按前缀长度归一化成 CIDR 字符串
pub fn network_string(ip: IpAddr, prefix_len: usize) -> String {
    match ip {
        IpAddr::V4(addr) => {
            // IPv4 查询在 IPv6 树上可能返回相对 128 位的前缀
            let prefix = if prefix_len > 32 {
                (prefix_len - 96).min(32)
            } else {
                prefix_len
            };
            let bits = u32::from(addr);
            let masked = if prefix == 0 {
                0
            } else {
                bits & (u32::MAX << (32 - prefix as u32))
            };
            format!("{}/{}", Ipv4Addr::from(masked), prefix)
        }
        IpAddr::V6(addr) => {
            let prefix = prefix_len.min(128);
            let bits = u128::from(addr);
            let masked = if prefix == 0 {
                0
            } else {
                bits & (u128::MAX << (128 - prefix as u32))
            };
            format!("{}/{}", Ipv6Addr::from(masked), prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_string_v4() {
        let ip: IpAddr = "1.1.1.1".parse().unwrap();
        assert_eq!(network_string(ip, 24), "1.1.1.0/24");
        assert_eq!(network_string(ip, 32), "1.1.1.1/32");
        assert_eq!(network_string(ip, 0), "0.0.0.0/0");
    }

    #[test]
    fn test_network_string_v4_in_v6_tree() {
        let ip: IpAddr = "1.1.1.1".parse().unwrap();
        // 120 位前缀相当于 IPv4 的 /24
        assert_eq!(network_string(ip, 120), "1.1.1.0/24");
    }

    #[test]
    fn test_network_string_v6() {
        let ip: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(network_string(ip, 32), "2001:db8::/32");
        assert_eq!(network_string(ip, 128), "2001:db8::1/128");
    }

    #[test]
    fn test_open_missing_file() {
        let err = DatasetHandle::open("/nonexistent/GeoLite2-City.mmdb").unwrap_err();
        assert!(matches!(err, IpRegionError::DatasetOpen(_)));
    }
}
