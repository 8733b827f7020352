//! HTTP 接口层：路由、中间件与响应包装

pub mod middleware;
pub mod response;
pub mod services;
