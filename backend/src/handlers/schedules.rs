use actix_web::{web, HttpResponse};
use admission_shared::{
    ApiResponse, CreateScheduleNotificationsRequest, CreateScheduleRequest, MarkNotificationFailedRequest,
    PaginationQuery, SetStatusRequest, UpcomingQuery, UpdateScheduleRequest,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::ScheduleService;
use crate::utils::validate_request;

pub async fn list_schedules(
    query: web::Query<PaginationQuery>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let (schedules, pagination) = service.get_all(query.page(), query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        "Schedules retrieved successfully",
        schedules,
        pagination,
    )))
}

pub async fn list_upcoming_schedules(
    query: web::Query<UpcomingQuery>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let schedules = service.get_upcoming(query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Upcoming schedules retrieved successfully", schedules)))
}

pub async fn list_schedules_by_academic_year(
    academic_year_id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let (schedules, pagination) = service
        .get_by_academic_year(*academic_year_id, query.page(), query.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        "Schedules retrieved successfully",
        schedules,
        pagination,
    )))
}

pub async fn get_schedule(
    id: web::Path<Uuid>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    debug!("Getting schedule {}", id);

    let schedule = service.get_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Schedule retrieved successfully", schedule)))
}

pub async fn create_schedule(
    user: AuthenticatedUser,
    request: web::Json<CreateScheduleRequest>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let schedule = service.create(request.into_inner(), user.user_id).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Schedule created successfully", schedule)))
}

pub async fn update_schedule(
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    request: web::Json<UpdateScheduleRequest>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let schedule = service.update(*id, request.into_inner(), user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Schedule updated successfully", schedule)))
}

pub async fn delete_schedule(
    id: web::Path<Uuid>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    service.delete(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Schedule deleted successfully")))
}

pub async fn set_schedule_status(
    id: web::Path<Uuid>,
    request: web::Json<SetStatusRequest>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let schedule = service.set_status(*id, request.is_active).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Schedule status updated successfully", schedule)))
}

pub async fn create_schedule_notifications(
    id: web::Path<Uuid>,
    request: web::Json<CreateScheduleNotificationsRequest>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    validate_request(&*request)?;

    let notifications = service.create_notification(*id, &request.user_ids).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Schedule notifications created successfully",
        notifications,
    )))
}

pub async fn list_schedule_notifications(
    id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let (notifications, pagination) = service
        .get_notifications(*id, query.page(), query.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        "Schedule notifications retrieved successfully",
        notifications,
        pagination,
    )))
}

pub async fn list_pending_notifications(
    query: web::Query<UpcomingQuery>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let notifications = service.get_pending_notifications(query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Pending notifications retrieved successfully",
        notifications,
    )))
}

pub async fn mark_notification_sent(
    id: web::Path<Uuid>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    let notification = service.mark_notification_sent(*id).await?;

    info!("Notification {} marked as sent", notification.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success("Notification marked as sent", notification)))
}

pub async fn mark_notification_failed(
    id: web::Path<Uuid>,
    request: web::Json<MarkNotificationFailedRequest>,
    service: web::Data<ScheduleService>,
) -> Result<HttpResponse, AppError> {
    validate_request(&*request)?;

    let notification = service
        .mark_notification_failed(*id, &request.error_message)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Notification marked as failed", notification)))
}
