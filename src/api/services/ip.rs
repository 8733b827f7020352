//! IP 查询接口
//!
//! `GET /ip` 解析调用方自己的地址（优先 X-Forwarded-For，其次
//! X-Real-IP，最后对端地址），`GET /ip/{ip}` 解析指定地址。

use actix_web::{HttpRequest, HttpResponse, web};
use tracing::trace;

use crate::api::response::ApiResponse;
use crate::services::GeoResolver;

pub struct IpService;

impl IpService {
    pub async fn lookup(
        path: web::Path<String>,
        resolver: web::Data<GeoResolver>,
    ) -> HttpResponse {
        Self::respond(resolver.get_ref(), &path.into_inner())
    }

    pub async fn lookup_self(req: HttpRequest, resolver: web::Data<GeoResolver>) -> HttpResponse {
        let ip = client_ip(&req);
        trace!("Resolving client address {}", ip);
        Self::respond(resolver.get_ref(), &ip)
    }

    fn respond(resolver: &GeoResolver, ip: &str) -> HttpResponse {
        match resolver.resolve(ip) {
            Ok(record) => ApiResponse::success(record),
            Err(e) => ApiResponse::from_error(&e),
        }
    }
}

/// 提取真实客户端地址
pub fn client_ip(req: &HttpRequest) -> String {
    if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(value) = real_ip.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

pub fn ip_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ip").route(web::get().to(IpService::lookup_self)))
        .service(web::resource("/ip/{ip}").route(web::get().to(IpService::lookup)));
}
