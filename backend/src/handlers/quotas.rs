use actix_web::{web, HttpResponse};
use admission_shared::{
    ApiResponse, CreateMajorQuotaRequest, PaginationQuery, QuotaAvailabilityQuery, UpdateMajorQuotaRequest,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::QuotaService;

pub async fn list_quotas(
    query: web::Query<PaginationQuery>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let (quotas, pagination) = service.get_all(query.page(), query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated("Quotas retrieved successfully", quotas, pagination)))
}

pub async fn get_quota(
    id: web::Path<Uuid>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.get_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Quota retrieved successfully", quota)))
}

/// Answers whether a new admission could be accepted for the pair right now.
pub async fn check_quota_availability(
    query: web::Query<QuotaAvailabilityQuery>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    debug!(
        "Checking quota availability for major {} in year {}",
        query.major_id, query.academic_year_id
    );

    service
        .validate_available_quota(query.major_id, query.academic_year_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Quota is available")))
}

pub async fn create_quota(
    user: AuthenticatedUser,
    request: web::Json<CreateMajorQuotaRequest>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.create(request.into_inner(), user.user_id).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Quota created successfully", quota)))
}

pub async fn update_quota(
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    request: web::Json<UpdateMajorQuotaRequest>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.update(*id, request.into_inner(), user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Quota updated successfully", quota)))
}

pub async fn delete_quota(
    id: web::Path<Uuid>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    service.delete(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Quota deleted successfully")))
}

pub async fn increase_filled_quota(
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.increase_filled(*id, user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Filled quota increased successfully", quota)))
}

pub async fn decrease_filled_quota(
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.decrease_filled(*id, user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Filled quota decreased successfully", quota)))
}

pub async fn reset_filled_quota(
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let quota = service.reset_filled(*id, user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Filled quota reset successfully", quota)))
}

pub async fn list_quota_logs(
    id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
    service: web::Data<QuotaService>,
) -> Result<HttpResponse, AppError> {
    let (logs, pagination) = service
        .get_quota_logs(*id, query.page(), query.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated("Quota logs retrieved successfully", logs, pagination)))
}
