use admission_shared::{
    AddMajorFileRequest, CreateMajorRequest, PaginationMeta, SearchMajorQuery, UpdateMajorRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{page_offset, Major, MajorFile};
use crate::repositories::{MajorRepository, Repositories};
use crate::utils::{field_error, normalize_keyword, validate_major_code, validate_major_file, validate_request};


#[derive(Clone)]
pub struct MajorService {
    majors: Arc<dyn MajorRepository>,
}

impl MajorService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            majors: repositories.majors.clone(),
        }
    }

    pub async fn create(&self, request: CreateMajorRequest) -> Result<Major, AppError> {
        validate_request(&request)?;
        validate_major_code(&request.code).map_err(|e| field_error("code", e))?;

        if self.majors.find_by_code(&request.code).await?.is_some() {
            return Err(AppError::Conflict("Major code already exists".to_string()));
        }

        let major = self.majors.create(&request).await?;
        info!("Created major {} ({})", major.code, major.id);
        Ok(major)
    }

    pub async fn get_all(&self, page: i64, limit: i64) -> Result<(Vec<Major>, PaginationMeta), AppError> {
        let (majors, total) = self
            .majors
            .search(None, None, limit, page_offset(page, limit))
            .await?;
        Ok((majors, PaginationMeta::new(page, limit, total)))
    }

    pub async fn search(&self, query: &SearchMajorQuery) -> Result<(Vec<Major>, PaginationMeta), AppError> {
        let keyword = normalize_keyword(query.keyword.as_deref())?;
        let pagination = query.pagination();
        let (page, limit) = (pagination.page(), pagination.limit());

        let (majors, total) = self
            .majors
            .search(keyword.as_deref(), query.is_active, limit, page_offset(page, limit))
            .await?;
        Ok((majors, PaginationMeta::new(page, limit, total)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Major, AppError> {
        self.majors
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Major not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, request: UpdateMajorRequest) -> Result<Major, AppError> {
        validate_request(&request)?;
        validate_major_code(&request.code).map_err(|e| field_error("code", e))?;

        let current = self.get_by_id(id).await?;
        if current.code != request.code {
            if let Some(existing) = self.majors.find_by_code(&request.code).await? {
                if existing.id != id {
                    return Err(AppError::Conflict("Major code already exists".to_string()));
                }
            }
        }

        let major = self
            .majors
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Major not found".to_string()))?;

        info!("Updated major {}", id);
        Ok(major)
    }

    /// Removes an inactive major along with its file records.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let major = self.get_by_id(id).await?;
        if major.is_active {
            return Err(AppError::Conflict("Cannot delete an active major".to_string()));
        }

        if !self.majors.delete_with_files(id).await? {
            return Err(AppError::Conflict(
                "Major changed while deleting, try again".to_string(),
            ));
        }

        info!("Deleted major {}", id);
        Ok(())
    }

    pub async fn set_status(&self, id: Uuid, is_active: bool) -> Result<Major, AppError> {
        if !self.majors.set_status(id, is_active).await? {
            return Err(AppError::NotFound("Major not found".to_string()));
        }

        info!("Major {} is_active={}", id, is_active);
        self.get_by_id(id).await
    }

    pub async fn add_file(&self, major_id: Uuid, request: AddMajorFileRequest) -> Result<MajorFile, AppError> {
        validate_request(&request)?;
        validate_major_file(&request.mime_type, request.file_size).map_err(|e| field_error("file", e))?;
        self.get_by_id(major_id).await?;

        let file = self.majors.add_file(major_id, &request).await?;
        info!("Attached file {} to major {}", file.id, major_id);
        Ok(file)
    }

    pub async fn get_files(&self, major_id: Uuid) -> Result<Vec<MajorFile>, AppError> {
        self.get_by_id(major_id).await?;
        self.majors.find_files(major_id).await
    }

    pub async fn delete_file(&self, major_id: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let file = self
            .majors
            .find_file(file_id)
            .await?
            .filter(|f| f.major_id == major_id)
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        self.majors.delete_file(file.id).await?;
        info!("Removed file {} from major {}", file.id, major_id);
        Ok(())
    }
}
