use crate::admin;
use crate::auth;
use crate::blog;
use crate::error::AppError;
use actix_web::{web, HttpResponse, Responder};

/// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "inkpost"
    }))
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Malformed JSON bodies get the same `{"message"}` shape as other failures
    cfg.app_data(
        web::JsonConfig::default().error_handler(|e, _| AppError::Validation(e.to_string()).into()),
    );

    auth::configure_auth_routes(cfg);
    blog::configure_blog_routes(cfg);
    admin::configure_admin_routes(cfg);

    cfg.route("/health", web::get().to(health_check));
}
