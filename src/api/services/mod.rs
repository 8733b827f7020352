mod admin;
mod health;
mod ip;

pub use admin::{AdminService, admin_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use ip::{IpService, client_ip, ip_routes};
