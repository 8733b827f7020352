use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{App, HttpServer, middleware::from_fn, web};
use tracing::info;

use ipregion::api::middleware::AuthMiddleware;
use ipregion::api::services::{AppStartTime, admin_routes, health_routes, ip_routes};
use ipregion::config;
use ipregion::services::geoip::{DatasetRegistry, GeoResolver};
use ipregion::services::refresh::RefreshService;
use ipregion::system::logging::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    config::init_config();
    init_logging();

    let config = config::get_config();
    info!("ipregion {} started", env!("CARGO_PKG_VERSION"));
    if config.auth.enabled() {
        info!("API secret authentication enabled");
    } else {
        info!("API is open (API_SECRET not set)");
    }

    let registry = Arc::new(DatasetRegistry::new());

    // 后台刷新：启动时加载本地数据集（没有则立即下载），之后按计划刷新
    let refresh = Arc::new(RefreshService::new(registry.clone()));
    refresh.clone().spawn_scheduler();

    let resolver_data = web::Data::new(GeoResolver::new(registry.clone()));
    let registry_data = web::Data::new(registry);
    let refresh_data = web::Data::new(refresh);
    let start_time_data = web::Data::new(AppStartTime {
        start_datetime: chrono::Utc::now(),
    });

    let governor_conf = GovernorConfigBuilder::default()
        .seconds_per_request(config.rate_limit.seconds_per_request)
        .burst_size(config.rate_limit.burst)
        .finish()
        .expect("Invalid rate limit config");

    let bind_addr = (config.server.host.clone(), config.server.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(resolver_data.clone())
            .app_data(registry_data.clone())
            .app_data(refresh_data.clone())
            .app_data(start_time_data.clone())
            .configure(health_routes)
            .service(
                web::scope("")
                    .wrap(from_fn(AuthMiddleware::api_auth))
                    .wrap(Governor::new(&governor_conf))
                    .configure(ip_routes)
                    .configure(admin_routes),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
