mod modules;

use modules::cli;
use modules::config;
use modules::error;
use modules::database::{blogs, users};
use modules::auth::{password, session, token};
use modules::media::{self, cloudinary, inline};
use modules::web::{admin, auth, blog, routes, upload};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use cloudinary::CloudinaryStore;
use config::Config;
use log::info;
use media::MediaStore;
use std::sync::Arc;

fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = match cli::run() {
        Ok(cli::Action::Serve(args)) => args,
        Ok(cli::Action::Done) => return Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    async_web_server(config)
}

fn cors_for(config: &Config) -> Cors {
    let origin = config.server.allowed_origin.trim();
    if origin.is_empty() {
        return Cors::default();
    }

    Cors::default()
        .allowed_origin(origin)
        .supports_credentials()
        .allow_any_method()
        .allow_any_header()
}

#[actix_web::main]
async fn async_web_server(config: Config) -> std::io::Result<()> {
    info!("Starting inkpost...");
    info!("Database: {}", config.paths.database_path.display());
    info!("Staging directory: {}", config.paths.upload_dir.display());
    if config.server.allowed_origin.is_empty() {
        info!("No REQ_ORIGIN set, cross-origin requests will be refused");
    } else {
        info!("Allowing credentialed requests from {}", config.server.allowed_origin);
    }

    std::fs::create_dir_all(&config.paths.upload_dir)?;

    // Create tables up front so the first request does not race on schema setup
    if let Err(e) = blogs::BlogDB::new(&config.database_path()) {
        eprintln!("Failed to open database: {}", e);
        std::process::exit(1);
    }

    let media: Arc<dyn MediaStore> = Arc::new(CloudinaryStore::new(config.media.clone()));
    let media = web::Data::from(media);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(media.clone())
            .wrap(cors_for(&config))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .service(actix_files::Files::new("/uploads", &config.paths.upload_dir))
            .configure(routes::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
