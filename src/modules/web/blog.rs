use crate::blogs::{BlogDB, NewPost, PostChanges, LATEST_LIMIT};
use crate::config::Config;
use crate::error::AppError;
use crate::inline::rewrite_inline_images;
use crate::media::{upload_cover, MediaStore};
use crate::session::Session;
use crate::upload::{read_post_form, PostForm, StagedFile};
use crate::users::{User, UserDB};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

/// Upload the staged cover and remove the local copy whatever the outcome
async fn relocate_cover(
    media: &dyn MediaStore,
    config: &Config,
    file: StagedFile,
) -> Result<String, AppError> {
    log::debug!("Relocating cover {} ({} bytes)", file.original_name, file.size);
    let result = upload_cover(media, &file.path, &file.mime_type, &config.media.cover_folder).await;
    file.remove();
    Ok(result?)
}

async fn relocate_content(
    media: &dyn MediaStore,
    config: &Config,
    content: &str,
) -> Result<String, AppError> {
    let rewrite = rewrite_inline_images(media, content, &config.media.inline_folder).await?;
    for relocation in &rewrite.uploads {
        log::debug!("Inline image ({} chars) now at {}", relocation.data_uri.len(), relocation.url);
    }
    Ok(rewrite.content)
}

/// Load the user behind a session; the token may outlive the account.
fn acting_user(config: &Config, user_id: &str) -> Result<User, AppError> {
    let users = UserDB::new(&config.database_path())?;
    users
        .find_by_id(user_id)?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

/// `POST /create`
pub async fn create_post(
    session: Session,
    payload: Multipart,
    config: web::Data<Config>,
    media: web::Data<dyn MediaStore>,
) -> Result<HttpResponse, AppError> {
    let claims = session.0;
    let mut form = read_post_form(payload, &config.paths.upload_dir, &config.uploads).await?;

    let author = match acting_user(&config, &claims.id) {
        Ok(user) => user,
        Err(e) => {
            form.discard();
            return Err(e);
        }
    };

    let Some(file) = form.file.take() else {
        return Err(AppError::Validation("A cover image file is required".to_string()));
    };

    let cover = relocate_cover(media.get_ref(), &config, file).await?;
    let content = relocate_content(media.get_ref(), &config, &form.text("content").unwrap_or_default()).await?;

    let blogs = BlogDB::new(&config.database_path())?;
    let post = blogs.create(NewPost {
        title: form.text("title").unwrap_or_default(),
        summary: form.text("summary").unwrap_or_default(),
        content,
        cover,
        author: author.id,
    })?;

    log::info!("User {} created post {}", author.username, post.id);
    Ok(HttpResponse::Ok().json(post))
}

/// `GET /blogs`
pub async fn list_posts(config: web::Data<Config>) -> Result<HttpResponse, AppError> {
    let blogs = BlogDB::new(&config.database_path())?;
    let posts = blogs.list_latest(LATEST_LIMIT)?;
    Ok(HttpResponse::Ok().json(posts))
}

/// `GET /blog/{id}`
pub async fn get_post(
    path: web::Path<String>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let blogs = BlogDB::new(&config.database_path())?;

    match blogs.get_with_author(&id)? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Err(AppError::NotFound("Blog not found".to_string())),
    }
}

/// Checks that run before anything is uploaded: the post exists and the
/// caller is its author or an admin.
fn authorize_edit(config: &Config, form: &PostForm, user_id: &str) -> Result<String, AppError> {
    let id = form
        .text("id")
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Post id is required".to_string()))?;

    let blogs = BlogDB::new(&config.database_path())?;
    let post = blogs
        .get(&id)?
        .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))?;

    let user = acting_user(config, user_id)?;

    if post.author != user.id && !user.is_admin {
        log::info!("User {} may not edit post {}", user.username, post.id);
        return Err(AppError::Forbidden("You are not authorized to edit this post".to_string()));
    }

    Ok(post.id)
}

/// `PUT /create`
pub async fn update_post(
    session: Session,
    payload: Multipart,
    config: web::Data<Config>,
    media: web::Data<dyn MediaStore>,
) -> Result<HttpResponse, AppError> {
    let claims = session.0;
    let mut form = read_post_form(payload, &config.paths.upload_dir, &config.uploads).await?;

    let post_id = match authorize_edit(&config, &form, &claims.id) {
        Ok(id) => id,
        Err(e) => {
            form.discard();
            return Err(e);
        }
    };

    let cover = match form.file.take() {
        Some(file) => Some(relocate_cover(media.get_ref(), &config, file).await?),
        None => None,
    };
    let content = match form.text("content") {
        Some(content) => Some(relocate_content(media.get_ref(), &config, &content).await?),
        None => None,
    };

    let blogs = BlogDB::new(&config.database_path())?;
    let changes = PostChanges {
        title: form.text("title"),
        summary: form.text("summary"),
        content,
        cover,
    };

    match blogs.update(&post_id, changes)? {
        Some(post) => {
            log::info!("User {} updated post {}", claims.username, post.id);
            Ok(HttpResponse::Ok().json(post))
        }
        // deleted between the check and the write
        None => Err(AppError::NotFound("Blog not found".to_string())),
    }
}

pub fn configure_blog_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/create", web::post().to(create_post))
        .route("/create", web::put().to(update_post))
        .route("/blogs", web::get().to(list_posts))
        .route("/blog/{id}", web::get().to(get_post));
}
