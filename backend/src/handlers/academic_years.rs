use actix_web::{web, HttpResponse};
use admission_shared::{
    ApiResponse, CreateAcademicYearRequest, PaginationQuery, SetStatusRequest, UpdateAcademicYearRequest,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::services::AcademicYearService;

pub async fn list_academic_years(
    query: web::Query<PaginationQuery>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    let (years, pagination) = service.get_all(query.page(), query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        "Academic years retrieved successfully",
        years,
        pagination,
    )))
}

pub async fn get_active_academic_year(
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    let year = service.get_active().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Active academic year retrieved successfully", year)))
}

pub async fn get_academic_year(
    id: web::Path<Uuid>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    debug!("Getting academic year {}", id);

    let year = service.get_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Academic year retrieved successfully", year)))
}

pub async fn create_academic_year(
    user: AuthenticatedUser,
    request: web::Json<CreateAcademicYearRequest>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    let year = service.create(request.into_inner()).await?;

    info!("Academic year {} created by {}", year.formatted_name(), user.user_id);

    Ok(HttpResponse::Created().json(ApiResponse::success("Academic year created successfully", year)))
}

pub async fn update_academic_year(
    id: web::Path<Uuid>,
    request: web::Json<UpdateAcademicYearRequest>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    let year = service.update(*id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Academic year updated successfully", year)))
}

pub async fn delete_academic_year(
    id: web::Path<Uuid>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    service.delete(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Academic year deleted successfully")))
}

pub async fn set_academic_year_status(
    id: web::Path<Uuid>,
    request: web::Json<SetStatusRequest>,
    service: web::Data<AcademicYearService>,
) -> Result<HttpResponse, AppError> {
    let year = service.set_status(*id, request.is_active).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Academic year status updated successfully", year)))
}
