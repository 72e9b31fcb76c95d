use actix_web::{web, HttpResponse};
use admission_shared::{
    AddMajorFileRequest, ApiResponse, CreateMajorRequest, PaginationQuery, SearchMajorQuery, SetStatusRequest,
    UpdateMajorRequest,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::MajorService;

pub async fn list_majors(
    query: web::Query<PaginationQuery>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let (majors, pagination) = service.get_all(query.page(), query.limit()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated("Majors retrieved successfully", majors, pagination)))
}

/// `?keyword=&is_active=&page=&limit=`
pub async fn search_majors(
    query: web::Query<SearchMajorQuery>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    debug!("Searching majors with query: {:?}", query);

    let (majors, pagination) = service.search(&query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated("Majors retrieved successfully", majors, pagination)))
}

pub async fn get_major(
    id: web::Path<Uuid>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let major = service.get_by_id(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Major retrieved successfully", major)))
}

pub async fn create_major(
    request: web::Json<CreateMajorRequest>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let major = service.create(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Major created successfully", major)))
}

pub async fn update_major(
    id: web::Path<Uuid>,
    request: web::Json<UpdateMajorRequest>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let major = service.update(*id, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Major updated successfully", major)))
}

pub async fn delete_major(
    id: web::Path<Uuid>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    service.delete(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Major deleted successfully")))
}

pub async fn set_major_status(
    id: web::Path<Uuid>,
    request: web::Json<SetStatusRequest>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let major = service.set_status(*id, request.is_active).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Major status updated successfully", major)))
}

pub async fn list_major_files(
    id: web::Path<Uuid>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let files = service.get_files(*id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Major files retrieved successfully", files)))
}

/// Records metadata for a document that has already been stored.
pub async fn add_major_file(
    id: web::Path<Uuid>,
    request: web::Json<AddMajorFileRequest>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let file = service.add_file(*id, request.into_inner()).await?;

    info!("Attached file {} to major {}", file.id, file.major_id);

    Ok(HttpResponse::Created().json(ApiResponse::success("Major file added successfully", file)))
}

pub async fn delete_major_file(
    path: web::Path<(Uuid, Uuid)>,
    service: web::Data<MajorService>,
) -> Result<HttpResponse, AppError> {
    let (major_id, file_id) = path.into_inner();
    service.delete_file(major_id, file_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Major file deleted successfully")))
}
