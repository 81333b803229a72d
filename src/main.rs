use std::env;

use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use freepharma_fiscal::{config, middleware::auth_middleware::Authentication};

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    // Route log-crate records (diesel, r2d2) into tracing
    tracing_log::LogTracer::init().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app_host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let app_port = env::var("APP_PORT").unwrap_or_else(|_| "8080".to_string());
    let app_url = format!("{}:{}", &app_host, &app_port);
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = config::db::init_db_pool(&db_url);
    config::db::run_migration(&mut pool.get().expect("Failed to get connection for migration"))
        .expect("Failed to run database migrations");

    tracing::info!(%app_url, "Starting fiscal service");

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .send_wildcard()
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
                    .allowed_header(http::header::CONTENT_TYPE)
                    .max_age(3600),
            )
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(pool.clone()))
            .wrap(Authentication)
            .configure(config::app::config_services)
    })
    .bind(&app_url)?
    .run()
    .await
}
