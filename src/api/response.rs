//! 统一响应包装
//!
//! 所有接口返回 `{code, message, data}`：code 0 表示成功，1 表示失败。
//! 仅无效输入映射 400、快照未就绪映射 503；单个来源的降级不影响 200。

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::IpRegionError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> HttpResponse {
        HttpResponse::Ok().json(ApiResponse::<()> {
            code: 0,
            message: message.to_string(),
            data: None,
        })
    }

    pub fn error(status: StatusCode, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(ApiResponse::<()> {
            code: 1,
            message: message.to_string(),
            data: None,
        })
    }

    pub fn unauthorized() -> HttpResponse {
        Self::error(StatusCode::UNAUTHORIZED, "auth fail")
    }

    pub fn from_error(err: &IpRegionError) -> HttpResponse {
        Self::error(status_for(err), &err.to_string())
    }
}

/// 错误分类到 HTTP 状态码的映射
pub fn status_for(err: &IpRegionError) -> StatusCode {
    match err {
        IpRegionError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        IpRegionError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
