use admission_shared::{AddMajorFileRequest, CreateMajorRequest, FileType, UpdateMajorRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::AppError;

const MAJOR_COLUMNS: &str = "id, name, code, description, is_active, icon_url, created_at, updated_at";
const FILE_COLUMNS: &str =
    "id, major_id, title, file_type, file_path, file_size, mime_type, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Major {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for a document attached to a major. The bytes live in external storage.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MajorFile {
    pub id: Uuid,
    pub major_id: Uuid,
    pub title: String,
    pub file_type: FileType,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Major {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        request: &CreateMajorRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Major>(&format!(
            r#"
            INSERT INTO majors (name, code, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {MAJOR_COLUMNS}
            "#
        ))
        .bind(&request.name)
        .bind(&request.code)
        .bind(&request.description)
        .bind(request.is_active)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let major = sqlx::query_as::<_, Major>(&format!(
            "SELECT {MAJOR_COLUMNS} FROM majors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(major)
    }

    pub async fn find_by_code<'e, E: PgExecutor<'e>>(
        executor: E,
        code: &str,
    ) -> Result<Option<Self>, AppError> {
        let major = sqlx::query_as::<_, Major>(&format!(
            "SELECT {MAJOR_COLUMNS} FROM majors WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(major)
    }

    /// Keyword matches name, code or description case-insensitively.
    /// `None` filters are ignored.
    pub async fn search<'e, E: PgExecutor<'e>>(
        executor: E,
        keyword: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let pattern = keyword.map(|k| format!("%{}%", k));

        let majors = sqlx::query_as::<_, Major>(&format!(
            r#"
            SELECT {MAJOR_COLUMNS} FROM majors
            WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1 OR description ILIKE $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(pattern)
        .bind(is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(majors)
    }

    pub async fn count_search<'e, E: PgExecutor<'e>>(
        executor: E,
        keyword: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<i64, AppError> {
        let pattern = keyword.map(|k| format!("%{}%", k));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM majors
            WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1 OR description ILIKE $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            "#,
        )
        .bind(pattern)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        request: &UpdateMajorRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Major>(&format!(
            r#"
            UPDATE majors SET name = $2, code = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {MAJOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.code)
        .bind(&request.description)
        .fetch_optional(executor)
        .await
    }

    pub async fn set_status<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE majors SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fails with a foreign key violation while quotas still reference the major.
    pub async fn delete_inactive<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM majors WHERE id = $1 AND is_active = FALSE")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl MajorFile {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        major_id: Uuid,
        request: &AddMajorFileRequest,
    ) -> Result<Self, AppError> {
        let file = sqlx::query_as::<_, MajorFile>(&format!(
            r#"
            INSERT INTO major_files (major_id, title, file_type, file_path, file_size, mime_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(major_id)
        .bind(&request.title)
        .bind(request.file_type)
        .bind(&request.file_path)
        .bind(request.file_size)
        .bind(&request.mime_type)
        .fetch_one(executor)
        .await?;

        Ok(file)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let file = sqlx::query_as::<_, MajorFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM major_files WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(file)
    }

    pub async fn find_by_major<'e, E: PgExecutor<'e>>(
        executor: E,
        major_id: Uuid,
    ) -> Result<Vec<Self>, AppError> {
        let files = sqlx::query_as::<_, MajorFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM major_files WHERE major_id = $1 ORDER BY created_at ASC"
        ))
        .bind(major_id)
        .fetch_all(executor)
        .await?;

        Ok(files)
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM major_files WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_major<'e, E: PgExecutor<'e>>(
        executor: E,
        major_id: Uuid,
    ) -> Result<Vec<Self>, AppError> {
        let files = sqlx::query_as::<_, MajorFile>(&format!(
            "DELETE FROM major_files WHERE major_id = $1 RETURNING {FILE_COLUMNS}"
        ))
        .bind(major_id)
        .fetch_all(executor)
        .await?;

        Ok(files)
    }
}
