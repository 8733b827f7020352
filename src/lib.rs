//! ipregion - IP 地理位置解析服务
//!
//! 查询 GeoLite2 ASN/City 与 GeoCN 三个二进制数据集并把结果合并成
//! 一条规整记录，数据集按计划下载并原子热替换，替换期间查询不中断。
//!
//! # Architecture
//! - `services::geoip`: 数据集句柄、注册表快照与合并解析引擎
//! - `services::refresh`: 数据集下载与定时刷新
//! - `api`: HTTP 接口、鉴权中间件与响应包装
//! - `config`: 环境变量配置
//! - `system`: 日志等系统设施

pub mod api;
pub mod config;
pub mod errors;
pub mod services;
pub mod system;
