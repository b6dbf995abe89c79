//! inkpost module layout
//!
//! Core configuration, errors and CLI
pub mod config;
pub mod error;
pub mod cli;

// Persistence
pub mod database {
    pub mod users;
    pub mod blogs;
}

// Passwords, session tokens and request guards
pub mod auth {
    pub mod password;
    pub mod token;
    pub mod session;
}

// Remote image hosting
pub mod media {
    pub mod store;
    pub mod cloudinary;
    pub mod inline;
    #[cfg(test)]
    pub mod testing;

    pub use store::{upload_cover, ImageUpload, MediaError, MediaStore};
}

// HTTP handlers
pub mod web {
    pub mod upload;
    pub mod auth;
    pub mod blog;
    pub mod admin;
    pub mod routes;
    #[cfg(test)]
    pub mod testing;
}
