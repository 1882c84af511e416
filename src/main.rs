use std::io;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use diesel_migrations::MigrationHarness;
use log::info;

use usados_backend::auth::SessionGuard;
use usados_backend::config::Settings;
use usados_backend::db::connection;
use usados_backend::storage::MediaStore;
use usados_backend::{admin, auth, catalog, featured, AppState, MIGRATIONS};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(io::Error::other)?;

    let pool = connection::build_pool(&settings.database).map_err(io::Error::other)?;
    {
        let conn = &mut pool.get().map_err(io::Error::other)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(io::Error::other)?;
    }

    std::fs::create_dir_all(&settings.media.root)?;
    let media_root = settings.media.root.clone();
    let state = web::Data::new(AppState {
        pool,
        media: MediaStore::new(&settings.media.root, &settings.media.public_base_url),
        session_ttl_hours: settings.session.ttl_hours,
    });

    info!(
        "listening on http://{}:{}",
        settings.server.host, settings.server.port
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(SessionGuard)
            .wrap(cors)
            .app_data(state.clone())
            .service(Files::new("/media", media_root.clone()))
            // public storefront
            .route("/api/catalog", web::get().to(catalog::get_catalog))
            .route("/api/products/{id}", web::get().to(catalog::get_product))
            .route("/api/categories", web::get().to(catalog::get_categories))
            // sessions
            .route("/api/auth/signup", web::post().to(auth::signup))
            .route("/api/auth/signin", web::post().to(auth::signin))
            .route("/api/auth/signout", web::post().to(auth::signout))
            .route("/api/auth/session", web::get().to(auth::current_session))
            // admin: products
            .route("/api/admin/products", web::get().to(featured::admin_products))
            .route("/api/admin/products", web::post().to(admin::create_product))
            .route("/api/admin/products/{id}", web::put().to(admin::update_product))
            .route(
                "/api/admin/products/{id}",
                web::delete().to(admin::delete_product),
            )
            .route(
                "/api/admin/products/{id}/images",
                web::post().to(admin::upload_product_images),
            )
            .route(
                "/api/admin/products/{id}/images/{index}",
                web::delete().to(admin::remove_product_image),
            )
            // admin: featured ordering
            .route(
                "/api/admin/products/{id}/featured",
                web::post().to(featured::toggle_featured),
            )
            .route(
                "/api/admin/featured-order",
                web::get().to(featured::get_featured_order),
            )
            .route(
                "/api/admin/featured-order",
                web::put().to(featured::reorder),
            )
            // admin: categories
            .route(
                "/api/admin/categories",
                web::post().to(admin::create_category),
            )
            .route(
                "/api/admin/categories/{id}",
                web::put().to(admin::update_category),
            )
            .route(
                "/api/admin/categories/{id}",
                web::delete().to(admin::delete_category),
            )
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await
}
