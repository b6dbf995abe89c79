use crate::blogs::BlogDB;
use crate::config::Config;
use crate::error::AppError;
use crate::session::AdminUser;
use crate::users::UserDB;
use actix_web::{web, HttpResponse};

/// `GET /admin/users`: every user, password hashes excluded
pub async fn list_users(
    admin: AdminUser,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let users = UserDB::new(&config.database_path())?;
    let all = users.list()?;

    log::debug!("Admin {} listed {} users", admin.0.username, all.len());
    Ok(HttpResponse::Ok().json(all))
}

/// `DELETE /admin/blogs/{id}`
pub async fn delete_post(
    admin: AdminUser,
    path: web::Path<String>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let blogs = BlogDB::new(&config.database_path())?;

    if !blogs.delete(&id)? {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }

    log::info!("Admin {} deleted post {}", admin.0.username, id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Blog deleted successfully"
    })))
}

pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/users", web::get().to(list_users))
        .route("/admin/blogs/{id}", web::delete().to(delete_post));
}
