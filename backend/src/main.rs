use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use admission_backend::config::AppConfig;
use admission_backend::database::Database;
use admission_backend::error::AppError;
use admission_backend::handlers;
use admission_backend::repositories::Repositories;
use admission_backend::services::{AcademicYearService, MajorService, QuotaService, ScheduleService};
use admission_backend::utils::JwtService;

fn cors(allowed_origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600);

    match allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    info!("Starting admission backend on {}:{}", config.host, config.port);

    let database = Database::new(&config.database_url, config.database_max_connections).await?;
    database.migrate().await?;

    let jwt_service = JwtService::new(&config.jwt_secret)?;

    let repositories = Repositories::postgres(database.pool().clone());
    let academic_year_service = AcademicYearService::new(&repositories);
    let major_service = MajorService::new(&repositories);
    let quota_service = QuotaService::new(&repositories);
    let schedule_service = ScheduleService::new(&repositories);

    let cors_origin = config.cors_allowed_origin.clone();

    HttpServer::new(move || {
        let jwt_service = jwt_service.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(cors(cors_origin.as_deref()))
            .app_data(web::Data::new(academic_year_service.clone()))
            .app_data(web::Data::new(major_service.clone()))
            .app_data(web::Data::new(quota_service.clone()))
            .app_data(web::Data::new(schedule_service.clone()))
            .configure(move |cfg| handlers::configure_routes(cfg, jwt_service))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
    .map_err(AppError::from)
}
