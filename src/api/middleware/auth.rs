//! API 密钥验证中间件
//!
//! `API_SECRET` 未配置时接口完全开放；配置后请求必须携带
//! `Authorization: Bearer <secret>`，密钥支持逗号分隔的多个值。

use actix_web::middleware::Next;
use actix_web::{
    Error,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use tracing::{debug, info};

use crate::api::response::ApiResponse;
use crate::config::get_config;

pub struct AuthMiddleware;

impl AuthMiddleware {
    pub async fn api_auth(
        req: ServiceRequest,
        next: Next<BoxBody>,
    ) -> Result<ServiceResponse<BoxBody>, Error> {
        let config = get_config();
        if !config.auth.enabled() {
            return next.call(req).await;
        }

        if let Some(header) = req.headers().get("Authorization") {
            if let Ok(value) = header.to_str() {
                let token = value.strip_prefix("Bearer ").unwrap_or(value);
                if config.auth.api_secrets.iter().any(|s| s == token) {
                    debug!("API authentication succeeded");
                    return next.call(req).await;
                }
            }
        }

        info!("API authentication failed: missing or unknown secret");
        Ok(req.into_response(ApiResponse::unauthorized()))
    }
}
