//! 管理接口
//!
//! `POST /refresh` 手动触发一轮数据集刷新。幂等：已有刷新在进行时
//! 直接返回，不会产生第二次并发安装。

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use tracing::error;

use crate::api::response::ApiResponse;
use crate::services::RefreshService;

pub struct AdminService;

impl AdminService {
    pub async fn trigger_refresh(refresh: web::Data<Arc<RefreshService>>) -> HttpResponse {
        if refresh.is_running() {
            return ApiResponse::message("refresh already in progress");
        }
        let service = refresh.get_ref().clone();
        tokio::spawn(async move {
            match service.refresh_once().await {
                Ok(Some(generation)) => {
                    tracing::info!("Manual refresh installed generation {}", generation)
                }
                Ok(None) => {}
                Err(e) => error!("Manual dataset refresh failed: {}", e),
            }
        });
        ApiResponse::message("refresh started")
    }
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/refresh").route(web::post().to(AdminService::trigger_refresh)));
}
