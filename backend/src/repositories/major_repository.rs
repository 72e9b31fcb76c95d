use admission_shared::{AddMajorFileRequest, CreateMajorRequest, UpdateMajorRequest};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Major, MajorFile};

pub(crate) const DUPLICATE_MAJOR_CODE: &str = "Major code already exists";
pub(crate) const MAJOR_IN_USE: &str = "Major still has quotas";

#[async_trait]
pub trait MajorRepository: Send + Sync {
    async fn create(&self, request: &CreateMajorRequest) -> Result<Major, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Major>, AppError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Major>, AppError>;

    /// Newest first, with the total number of matches.
    async fn search(
        &self,
        keyword: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Major>, i64), AppError>;

    async fn update(&self, id: Uuid, request: &UpdateMajorRequest) -> Result<Option<Major>, AppError>;

    /// Deletes an inactive major together with its file records. Fails with
    /// `Conflict` while quotas still reference it.
    async fn delete_with_files(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<bool, AppError>;

    async fn add_file(&self, major_id: Uuid, request: &AddMajorFileRequest) -> Result<MajorFile, AppError>;

    async fn find_file(&self, id: Uuid) -> Result<Option<MajorFile>, AppError>;

    async fn find_files(&self, major_id: Uuid) -> Result<Vec<MajorFile>, AppError>;

    async fn delete_file(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgMajorRepository {
    pool: PgPool,
}

impl PgMajorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MajorRepository for PgMajorRepository {
    async fn create(&self, request: &CreateMajorRequest) -> Result<Major, AppError> {
        Major::create(&self.pool, request)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_MAJOR_CODE))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Major>, AppError> {
        Major::find_by_id(&self.pool, id).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Major>, AppError> {
        Major::find_by_code(&self.pool, code).await
    }

    async fn search(
        &self,
        keyword: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Major>, i64), AppError> {
        let majors = Major::search(&self.pool, keyword, is_active, limit, offset).await?;
        let total = Major::count_search(&self.pool, keyword, is_active).await?;
        Ok((majors, total))
    }

    async fn update(&self, id: Uuid, request: &UpdateMajorRequest) -> Result<Option<Major>, AppError> {
        Major::update(&self.pool, id, request)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_MAJOR_CODE))
    }

    async fn delete_with_files(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let files = MajorFile::delete_by_major(&mut *tx, id).await?;
        let deleted = Major::delete_inactive(&mut *tx, id)
            .await
            .map_err(|e| AppError::from_foreign_key_violation(e, MAJOR_IN_USE))?;

        if !deleted {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!("Removed {} file record(s) with major {}", files.len(), id);
        Ok(true)
    }

    async fn set_status(&self, id: Uuid, is_active: bool) -> Result<bool, AppError> {
        Major::set_status(&self.pool, id, is_active).await
    }

    async fn add_file(&self, major_id: Uuid, request: &AddMajorFileRequest) -> Result<MajorFile, AppError> {
        MajorFile::create(&self.pool, major_id, request).await
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<MajorFile>, AppError> {
        MajorFile::find_by_id(&self.pool, id).await
    }

    async fn find_files(&self, major_id: Uuid) -> Result<Vec<MajorFile>, AppError> {
        MajorFile::find_by_major(&self.pool, major_id).await
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, AppError> {
        MajorFile::delete(&self.pool, id).await
    }
}
