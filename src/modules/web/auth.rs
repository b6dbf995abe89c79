use crate::config::Config;
use crate::error::AppError;
use crate::password;
use crate::session::Session;
use crate::token::{self, COOKIE_NAME};
use crate::users::{NewUser, UserDB, UserSummary};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

/// Registration request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub admin_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by a successful login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

const WRONG_CREDENTIALS: &str = "Wrong Credentials";

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build(COOKIE_NAME, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .finish()
}

/// The admin flag is granted only for a non-empty configured code
fn grants_admin(config: &Config, admin_code: Option<&str>) -> bool {
    let expected = config.auth.admin_code.as_str();
    !expected.is_empty() && admin_code == Some(expected)
}

pub async fn register(
    body: web::Json<RegisterRequest>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let username = request.username.trim();

    if username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation("Username and password are required".to_string()));
    }

    let is_admin = grants_admin(&config, request.admin_code.as_deref());
    let password_hash = password::hash(&request.password, config.auth.password_hash_cost)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;

    let users = UserDB::new(&config.database_path())?;
    let user = users
        .create(NewUser {
            username,
            password_hash: &password_hash,
            is_admin,
        })
        .map_err(|e| match AppError::from(e) {
            AppError::Validation(_) => AppError::Validation(format!("Username '{}' is already taken", username)),
            other => other,
        })?;

    log::info!("Registered user {} (admin: {})", user.username, user.is_admin);
    Ok(HttpResponse::Ok().json(UserSummary::from(&user)))
}

pub async fn login(
    body: web::Json<LoginRequest>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let username = request.username.trim();

    let users = UserDB::new(&config.database_path())?;
    let user = match users.find_by_username(username)? {
        Some(user) => user,
        None => {
            log::debug!("Login for unknown user {}", username);
            return Ok(HttpResponse::Unauthorized().json(WRONG_CREDENTIALS));
        }
    };

    let password_ok = password::verify(&request.password, &user.password_hash).unwrap_or_else(|e| {
        log::error!("Stored hash for {} is unreadable: {}", user.username, e);
        false
    });
    if !password_ok {
        log::debug!("Wrong password for {}", user.username);
        return Ok(HttpResponse::Unauthorized().json(WRONG_CREDENTIALS));
    }

    let token = token::issue_for(&config.auth, &user.id, &user.username, user.is_admin)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    log::info!("User {} logged in", user.username);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token))
        .json(LoginResponse {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }))
}

pub async fn profile(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(session.0)
}

/// Clears the cookie on the client only; issued tokens stay valid until they expire.
pub async fn logout() -> HttpResponse {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json("deleted")
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/profile", web::get().to(profile))
        .route("/logout", web::post().to(logout));
}
