//! Request guards for cookie sessions.
//!
//! `Session` yields the verified token claims; `AdminUser` additionally
//! loads the user record and requires the admin flag. Both fail with a
//! typed [`AppError`] so handlers never see an unverified request.

use crate::config::Config;
use crate::error::AppError;
use crate::token::{self, Claims, TokenError, COOKIE_NAME};
use crate::users::{User, UserDB};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

pub struct Session(pub Claims);

pub struct AdminUser(pub User);

fn app_config(req: &HttpRequest) -> Result<&Config, AppError> {
    req.app_data::<web::Data<Config>>()
        .map(|data| data.get_ref())
        .ok_or_else(|| AppError::Internal("configuration not registered".to_string()))
}

/// Token from the session cookie, if any (an empty value counts as none)
pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn authenticate(req: &HttpRequest) -> Result<Claims, AppError> {
    let config = app_config(req)?;
    let token = session_token(req).ok_or_else(|| {
        AppError::Unauthorized("No token provided, authentication required.".to_string())
    })?;

    token::verify(&token, &config.auth.token_secret).map_err(|e| match e {
        TokenError::Expired => AppError::Unauthorized("Session expired, please log in again.".to_string()),
        _ => AppError::Unauthorized("Invalid token".to_string()),
    })
}

pub fn require_admin(req: &HttpRequest) -> Result<User, AppError> {
    let config = app_config(req)?;
    if session_token(req).is_none() {
        return Err(AppError::Unauthorized("No token, authorization denied".to_string()));
    }
    let claims = authenticate(req)?;

    let users = UserDB::new(&config.database_path())?;
    let user = users
        .find_by_id(&claims.id)?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_admin {
        log::info!("User {} denied admin access", user.username);
        return Err(AppError::Forbidden("Access denied. Admin rights required.".to_string()));
    }

    Ok(user)
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(Session))
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(require_admin(req).map(AdminUser))
    }
}
