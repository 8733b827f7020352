//! 解析引擎
//!
//! 将 ASN、City、GeoCN 三个数据集的查询结果合并成一条规整记录：
//!
//! 1. ASN 点查询填充 AS 号和组织名，命中固定运营商表时补充 `isp` 字段；
//! 2. City 网段查询填充国家、注册国家、经纬度和区域列表，名称按
//!    zh-CN → en 回退；
//! 3. 当国家 ISO 为 CN 且注册国家缺失或同为 CN 时，升级查询 GeoCN，
//!    其结果整体替换命中网段和区域列表，并补充更精确的 ISP 信息。
//!
//! 单个来源的查询失败只记日志并跳过，部分结果是合法输出；只有注册表
//! 还没有任何快照时才返回 `ServiceUnavailable`。

use std::net::IpAddr;
use std::sync::Arc;

use tracing::warn;

use crate::errors::{IpRegionError, Result};

use super::record::{
    AsInfo, AsnRecord, CityRecord, GeoCnRecord, GeoRecord, NameMap, preferred_name,
};
use super::registry::DatasetRegistry;

/// 已知 AS 号到运营商展示名的固定映射
const CARRIER_OVERRIDES: &[(u32, &str)] = &[
    (9812, "东方有线"),
    (9389, "中国长城"),
    (17962, "天威视讯"),
];

/// 直辖市后缀。省级名称以此结尾时，市字段与省相同，
/// 原始数据的 city 实际是区。
const MUNICIPALITY_SUFFIX: &str = "市";

pub fn carrier_name(asn: u32) -> Option<&'static str> {
    CARRIER_OVERRIDES
        .iter()
        .find(|(number, _)| *number == asn)
        .map(|(_, name)| *name)
}

/// 港澳台展示名前缀约定，仅限这三个名称
pub fn apply_region_override(name: String) -> String {
    match name.as_str() {
        "香港" | "澳门" | "台湾" => format!("中国{name}"),
        "Hong Kong" | "Macau" | "Taiwan" => format!("China {name}"),
        _ => name,
    }
}

/// 解析国家展示名：语言回退 + 港澳台前缀约定
pub fn country_display_name(names: &NameMap) -> Option<String> {
    preferred_name(names).map(apply_region_override)
}

/// GeoCN 升级条件：国家 ISO 为 CN，且注册国家缺失或同为 CN。
/// 仅地理上位于国内的外国注册网段不做国内细分。
pub fn should_escalate(city: &CityRecord) -> bool {
    let country_is_cn = city
        .country
        .as_ref()
        .and_then(|c| c.iso_code.as_deref())
        == Some("CN");
    let registered_is_cn = match city
        .registered_country
        .as_ref()
        .and_then(|c| c.iso_code.as_deref())
    {
        None => true,
        Some(code) => code == "CN",
    };
    country_is_cn && registered_is_cn
}

/// 去重（保留首次出现的顺序）并去掉空串
pub fn dedup_regions(values: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !value.is_empty() && !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

/// 直辖市折叠：省名以「市」结尾时 city = 省、district = 原始 city
pub fn collapse_municipality(cn: &GeoCnRecord) -> (String, String, String) {
    if cn.province.ends_with(MUNICIPALITY_SUFFIX) {
        (cn.province.clone(), cn.province.clone(), cn.city.clone())
    } else {
        (cn.province.clone(), cn.city.clone(), cn.districts.clone())
    }
}

pub fn apply_asn(record: &mut GeoRecord, asn: AsnRecord) {
    let number = asn.autonomous_system_number;
    record.asn = Some(AsInfo {
        number,
        name: asn.autonomous_system_organization,
    });
    // 运营商表命中时作为补充信息，不覆盖组织名
    if let Some(carrier) = number.and_then(carrier_name) {
        record.isp = Some(carrier.to_string());
    }
}

pub fn apply_city(record: &mut GeoRecord, city: &CityRecord, network: String) {
    record.network = Some(network);
    if let Some(country) = &city.country {
        record.country_code = country.iso_code.clone();
        record.country = country_display_name(&country.names);
    }
    if let Some(registered) = &city.registered_country {
        record.registered_country = country_display_name(&registered.names);
    }
    if let Some(location) = &city.location {
        record.latitude = location.latitude;
        record.longitude = location.longitude;
    }
    let mut regions: Vec<String> = city
        .subdivisions
        .iter()
        .filter_map(|s| preferred_name(&s.names))
        .collect();
    if let Some(city_name) = city.city.as_ref().and_then(|c| preferred_name(&c.names)) {
        regions.push(city_name);
    }
    record.regions = dedup_regions(regions);
}

/// GeoCN 命中时整体替换网段和区域列表，ISP 信息写入补充字段
pub fn apply_cn(record: &mut GeoRecord, cn: &GeoCnRecord, network: String) {
    record.network = Some(network);
    let (province, city, district) = collapse_municipality(cn);
    record.regions = dedup_regions(vec![province, city, district]);
    if !cn.isp.is_empty() {
        record.isp = Some(if cn.net.is_empty() {
            cn.isp.clone()
        } else {
            format!("{} ({})", cn.isp, cn.net)
        });
    }
}

/// 解析引擎。注册表以 Arc 注入，可在多个 worker 间共享。
#[derive(Clone)]
pub struct GeoResolver {
    registry: Arc<DatasetRegistry>,
}

impl GeoResolver {
    pub fn new(registry: Arc<DatasetRegistry>) -> Self {
        GeoResolver { registry }
    }

    pub fn registry(&self) -> &Arc<DatasetRegistry> {
        &self.registry
    }

    /// 解析一个原始 IP 字符串
    pub fn resolve(&self, raw: &str) -> Result<GeoRecord> {
        let ip: IpAddr = raw.trim().parse().map_err(|_| {
            IpRegionError::invalid_address(format!("invalid IP address: {raw:?}"))
        })?;
        let snapshot = self.registry.current().ok_or_else(|| {
            IpRegionError::service_unavailable("no dataset snapshot installed yet")
        })?;

        let mut record = GeoRecord::new(ip);

        if let Some(handle) = &snapshot.asn {
            match handle.lookup::<AsnRecord>(ip) {
                Ok(Some(asn)) => apply_asn(&mut record, asn),
                Ok(None) => {}
                Err(e) => warn!("ASN lookup failed for {}: {}", ip, e),
            }
        }

        let mut city_record: Option<CityRecord> = None;
        if let Some(handle) = &snapshot.city {
            match handle.lookup_network::<CityRecord>(ip) {
                Ok(Some((city, network))) => {
                    apply_city(&mut record, &city, network);
                    city_record = Some(city);
                }
                Ok(None) => {}
                Err(e) => warn!("City lookup failed for {}: {}", ip, e),
            }
        }

        if let (Some(city), Some(handle)) = (&city_record, &snapshot.cn) {
            if should_escalate(city) {
                match handle.lookup_network::<GeoCnRecord>(ip) {
                    Ok(Some((cn, network))) => apply_cn(&mut record, &cn, network),
                    Ok(None) => {}
                    Err(e) => warn!("GeoCN lookup failed for {}: {}", ip, e),
                }
            }
        }

        Ok(record)
    }
}
