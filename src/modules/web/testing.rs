use crate::config::Config;
use crate::media::testing::FakeMediaStore;
use crate::media::MediaStore;
use crate::routes;
use actix_web::{web, App};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub const BOUNDARY: &str = "inkpost-test-boundary";
pub const ADMIN_CODE: &str = "open-sesame";

/// App wiring over a throwaway database and staging directory
pub struct TestApp {
    pub config: Config,
    pub media: Arc<FakeMediaStore>,
    root: PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_media(FakeMediaStore::new())
    }

    pub fn with_media(media: FakeMediaStore) -> Self {
        let root = std::env::temp_dir().join(format!("inkpost_app_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();

        let mut config = Config::default();
        config.paths.database_path = root.join("blog.db");
        config.paths.upload_dir = root.join("uploads");
        config.auth.token_secret = "test-secret".to_string();
        config.auth.password_hash_cost = 1;
        config.auth.admin_code = ADMIN_CODE.to_string();

        Self {
            config,
            media: Arc::new(media),
            root,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let media: Arc<dyn MediaStore> = self.media.clone();
        App::new()
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::from(media))
            .configure(routes::configure_routes)
    }

    /// Files still sitting in the staging directory
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(&self.config.paths.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.root).ok();
    }
}

/// Encode text fields and an optional (field, file name, content type, bytes)
/// file part as `multipart/form-data` using [`BOUNDARY`].
pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                name, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
