//! HTTP 层测试：路由、响应包装、鉴权与健康检查

use std::sync::{Arc, Once};

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::Value;

use ipregion::api::middleware::AuthMiddleware;
use ipregion::api::services::{AppStartTime, admin_routes, health_routes, ip_routes};
use ipregion::config;
use ipregion::services::geoip::{DatasetRegistry, GeoResolver};
use ipregion::services::RefreshService;

static INIT: Once = Once::new();

/// 测试进程内的全局配置：固定 API 密钥、临时数据目录、
/// 不可路由的下载地址和极短的超时
fn init_test_env() {
    INIT.call_once(|| {
        let data_dir = std::env::temp_dir().join("ipregion-api-tests");
        unsafe {
            std::env::set_var("API_SECRET", "test-secret,backup-secret");
            std::env::set_var("DATA_DIR", &data_dir);
            std::env::set_var("ASN_DB_URL", "http://192.0.2.1/GeoLite2-ASN.mmdb");
            std::env::set_var("CITY_DB_URL", "http://192.0.2.1/GeoLite2-City.mmdb");
            std::env::set_var("CN_DB_URL", "");
            std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "1");
        }
        config::init_config();
    });
}

fn resolver_data(registry: &Arc<DatasetRegistry>) -> web::Data<GeoResolver> {
    web::Data::new(GeoResolver::new(registry.clone()))
}

#[actix_web::test]
async fn test_lookup_invalid_ip_returns_400() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    let app = test::init_service(
        App::new()
            .app_data(resolver_data(&registry))
            .configure(ip_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/ip/not-an-ip").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1);
    assert!(body["message"].as_str().unwrap().contains("Invalid Address"));
}

#[actix_web::test]
async fn test_lookup_before_first_refresh_returns_503() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    let app = test::init_service(
        App::new()
            .app_data(resolver_data(&registry))
            .configure(ip_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/ip/1.1.1.1").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1);
}

#[actix_web::test]
async fn test_lookup_with_empty_snapshot_returns_partial_record() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    registry.install(None, None, None);
    let app = test::init_service(
        App::new()
            .app_data(resolver_data(&registry))
            .configure(ip_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/ip/1.1.1.1").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["ip"], "1.1.1.1");
}

#[actix_web::test]
async fn test_lookup_self_uses_forwarded_header() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    registry.install(None, None, None);
    let app = test::init_service(
        App::new()
            .app_data(resolver_data(&registry))
            .configure(ip_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/ip")
            .insert_header(("X-Forwarded-For", "8.8.8.8, 10.0.0.1"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["ip"], "8.8.8.8");
}

#[actix_web::test]
async fn test_lookup_self_falls_back_to_real_ip_header() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    registry.install(None, None, None);
    let app = test::init_service(
        App::new()
            .app_data(resolver_data(&registry))
            .configure(ip_routes),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/ip")
            .insert_header(("X-Real-IP", "9.9.9.9"))
            .to_request(),
    )
    .await;

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["ip"], "9.9.9.9");
}

#[actix_web::test]
async fn test_auth_middleware_guards_routes() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    registry.install(None, None, None);
    let app = test::init_service(
        App::new().app_data(resolver_data(&registry)).service(
            web::scope("")
                .wrap(from_fn(AuthMiddleware::api_auth))
                .configure(ip_routes),
        ),
    )
    .await;

    // 无凭据
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/ip/1.1.1.1").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // 错误凭据
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/ip/1.1.1.1")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // 列表里的任意一个密钥都可用
    for secret in ["test-secret", "backup-secret"] {
        let resp = test::call_service(
            &app,
            TestRequest::get()
                .uri("/ip/1.1.1.1")
                .insert_header(("Authorization", format!("Bearer {secret}")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[actix_web::test]
async fn test_health_reflects_registry_state() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    let registry_data = web::Data::new(registry.clone());
    let start_time = web::Data::new(AppStartTime {
        start_datetime: chrono::Utc::now(),
    });
    let app = test::init_service(
        App::new()
            .app_data(registry_data)
            .app_data(start_time)
            .configure(health_routes),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    registry.install(None, None, None);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["datasets"]["generation"], 1);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_manual_refresh_trigger_is_idempotent() {
    init_test_env();
    let registry = Arc::new(DatasetRegistry::new());
    let refresh = Arc::new(RefreshService::new(registry.clone()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(refresh.clone()))
            .configure(admin_routes),
    )
    .await;

    // 触发刷新：下载地址不可路由，后台任务会失败，但响应立即返回
    let resp = test::call_service(&app, TestRequest::post().uri("/refresh").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);

    // 失败的刷新不会安装任何快照
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    assert!(!registry.is_ready());
}
