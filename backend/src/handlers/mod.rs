pub mod academic_years;
pub mod health;
pub mod majors;
pub mod quotas;
pub mod schedules;

#[cfg(test)]
mod tests;

use actix_web::web;
use admission_shared::UserRole;

use crate::middleware::AuthMiddleware;
use crate::utils::JwtService;

fn admin_only(jwt_service: &JwtService) -> AuthMiddleware {
    AuthMiddleware::new(jwt_service.clone()).require_role(UserRole::Admin)
}

/// Mounts the `/api/v1` surface. Reads are public; every mutation, the quota
/// audit trail and notification dispatch require an admin token.
pub fn configure_routes(cfg: &mut web::ServiceConfig, jwt_service: JwtService) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(
                web::scope("/academic-years")
                    .route("", web::get().to(academic_years::list_academic_years))
                    .route("/active", web::get().to(academic_years::get_active_academic_year))
                    .route("/{id}", web::get().to(academic_years::get_academic_year))
                    .route("/{id}/schedules", web::get().to(schedules::list_schedules_by_academic_year))
                    .service(
                        web::scope("")
                            .wrap(admin_only(&jwt_service))
                            .route("", web::post().to(academic_years::create_academic_year))
                            .route("/{id}", web::put().to(academic_years::update_academic_year))
                            .route("/{id}", web::delete().to(academic_years::delete_academic_year))
                            .route("/{id}/status", web::patch().to(academic_years::set_academic_year_status)),
                    ),
            )
            .service(
                web::scope("/majors")
                    .route("", web::get().to(majors::list_majors))
                    .route("/search", web::get().to(majors::search_majors))
                    .route("/{id}", web::get().to(majors::get_major))
                    .route("/{id}/files", web::get().to(majors::list_major_files))
                    .service(
                        web::scope("")
                            .wrap(admin_only(&jwt_service))
                            .route("", web::post().to(majors::create_major))
                            .route("/{id}", web::put().to(majors::update_major))
                            .route("/{id}", web::delete().to(majors::delete_major))
                            .route("/{id}/status", web::patch().to(majors::set_major_status))
                            .route("/{id}/files", web::post().to(majors::add_major_file))
                            .route("/{id}/files/{file_id}", web::delete().to(majors::delete_major_file)),
                    ),
            )
            .service(
                web::scope("/quotas")
                    .route("", web::get().to(quotas::list_quotas))
                    .route("/availability", web::get().to(quotas::check_quota_availability))
                    .route("/{id}", web::get().to(quotas::get_quota))
                    .service(
                        web::scope("")
                            .wrap(admin_only(&jwt_service))
                            .route("", web::post().to(quotas::create_quota))
                            .route("/{id}", web::put().to(quotas::update_quota))
                            .route("/{id}", web::delete().to(quotas::delete_quota))
                            .route("/{id}/increase", web::post().to(quotas::increase_filled_quota))
                            .route("/{id}/decrease", web::post().to(quotas::decrease_filled_quota))
                            .route("/{id}/reset", web::post().to(quotas::reset_filled_quota))
                            .route("/{id}/logs", web::get().to(quotas::list_quota_logs)),
                    ),
            )
            .service(
                web::scope("/schedules")
                    .route("", web::get().to(schedules::list_schedules))
                    .route("/upcoming", web::get().to(schedules::list_upcoming_schedules))
                    .route("/{id}", web::get().to(schedules::get_schedule))
                    .service(
                        web::scope("")
                            .wrap(admin_only(&jwt_service))
                            .route("", web::post().to(schedules::create_schedule))
                            .route("/{id}", web::put().to(schedules::update_schedule))
                            .route("/{id}", web::delete().to(schedules::delete_schedule))
                            .route("/{id}/status", web::patch().to(schedules::set_schedule_status))
                            .route("/{id}/notifications", web::post().to(schedules::create_schedule_notifications))
                            .route("/{id}/notifications", web::get().to(schedules::list_schedule_notifications)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .wrap(admin_only(&jwt_service))
                    .route("/pending", web::get().to(schedules::list_pending_notifications))
                    .route("/{id}/sent", web::patch().to(schedules::mark_notification_sent))
                    .route("/{id}/failed", web::patch().to(schedules::mark_notification_failed)),
            ),
    );
}
