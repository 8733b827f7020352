//! 数据集原始记录与解析结果模型
//!
//! 原始记录（`AsnRecord`/`CityRecord`/`GeoCnRecord`）按 MaxMind 数据库的
//! 字段布局反序列化；`GeoRecord` 是对外输出的规整结果，所有名称字段都
//! 已经过语言回退规则解析成单一字符串。

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// 多语言名称映射，键为语言代码（"zh-CN"、"en" 等）
pub type NameMap = BTreeMap<String, String>;

/// 首选 zh-CN，缺失时回退 en
pub fn preferred_name(names: &NameMap) -> Option<String> {
    names
        .get("zh-CN")
        .filter(|s| !s.is_empty())
        .or_else(|| names.get("en").filter(|s| !s.is_empty()))
        .cloned()
}

/// GeoLite2-ASN 记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsnRecord {
    pub autonomous_system_number: Option<u32>,
    pub autonomous_system_organization: Option<String>,
}

/// GeoLite2-City 的 country / registered_country 字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryRecord {
    pub iso_code: Option<String>,
    #[serde(default)]
    pub names: NameMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubdivisionRecord {
    #[serde(default)]
    pub names: NameMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceRecord {
    #[serde(default)]
    pub names: NameMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GeoLite2-City 记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityRecord {
    pub country: Option<CountryRecord>,
    pub registered_country: Option<CountryRecord>,
    #[serde(default)]
    pub subdivisions: Vec<SubdivisionRecord>,
    pub city: Option<PlaceRecord>,
    pub location: Option<LocationRecord>,
}

/// GeoCN 记录，字段为单语言字符串
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoCnRecord {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub districts: String,
    #[serde(default)]
    pub isp: String,
    #[serde(default)]
    pub net: String,
}

/// 自治系统信息
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// 解析结果。缺失的来源只会让对应字段留空，不会让整体失败。
#[derive(Debug, Clone, Serialize)]
pub struct GeoRecord {
    pub ip: String,
    /// 命中的网段（CIDR），以最具体的来源为准
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub asn: Option<AsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// 省/市/区等区域名，按行政层级排序，已去重去空
    pub regions: Vec<String>,
    /// 运营商补充信息，不替代 AS 组织名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
}

impl GeoRecord {
    pub fn new(ip: IpAddr) -> Self {
        GeoRecord {
            ip: ip.to_string(),
            network: None,
            asn: None,
            country: None,
            country_code: None,
            registered_country: None,
            latitude: None,
            longitude: None,
            regions: Vec::new(),
            isp: None,
        }
    }
}
