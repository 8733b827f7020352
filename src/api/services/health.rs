use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::trace;

use crate::services::DatasetRegistry;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        registry: web::Data<Arc<DatasetRegistry>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;

        let datasets = match registry.current() {
            Some(snapshot) => json!({
                "status": "healthy",
                "generation": snapshot.generation,
                "loaded_at": snapshot.loaded_at.to_rfc3339(),
                "asn": snapshot.asn.is_some(),
                "city": snapshot.city.is_some(),
                "cn": snapshot.cn.is_some(),
            }),
            None => json!({
                "status": "unhealthy",
                "error": "no dataset snapshot installed",
            }),
        };

        let is_healthy = registry.is_ready();
        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        HttpResponse::build(response_status)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(json!({
                "status": if is_healthy { "healthy" } else { "unhealthy" },
                "timestamp": now.to_rfc3339(),
                "uptime": uptime_seconds,
                "checks": { "datasets": datasets },
            }))
    }

    // 就绪检查：已安装快照才算就绪
    pub async fn readiness_check(registry: web::Data<Arc<DatasetRegistry>>) -> impl Responder {
        trace!("Received readiness check request");

        if registry.is_ready() {
            HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK")
        } else {
            HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("datasets not loaded")
        }
    }

    // 活跃性检查，检查基本服务可用性
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(HealthService::health_check)))
        .service(web::resource("/health/ready").route(web::get().to(HealthService::readiness_check)))
        .service(web::resource("/health/live").route(web::get().to(HealthService::liveness_check)));
}
