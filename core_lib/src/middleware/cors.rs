//! CORS (Cross-Origin Resource Sharing) middleware configuration

use axum::http::{HeaderName, Method};
use tower_http::cors::CorsLayer as TowerCorsLayer;

pub fn cors_layer() -> TowerCorsLayer {
    TowerCorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("x-token"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
