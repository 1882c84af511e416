use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod featured;
pub mod models;
pub mod storage;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Shared application state: explicit pool and media store instances
/// injected into handlers, never ambient globals.
pub struct AppState {
    pub pool: db::connection::PgPool,
    pub media: storage::MediaStore,
    pub session_ttl_hours: i64,
}
