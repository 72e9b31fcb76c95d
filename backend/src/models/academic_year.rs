use admission_shared::{CreateAcademicYearRequest, UpdateAcademicYearRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::AppError;

const COLUMNS: &str = "id, year_start, year_end, is_active, registration_start, registration_end, \
                       description, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: Uuid,
    pub year_start: i32,
    pub year_end: i32,
    pub is_active: bool,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYear {
    /// Display name such as `2025/2026`.
    pub fn formatted_name(&self) -> String {
        format!("{}/{}", self.year_start, self.year_end)
    }

    pub fn is_registration_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now > self.registration_start && now < self.registration_end
    }

    pub fn is_registration_open(&self) -> bool {
        self.is_registration_open_at(Utc::now())
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        request: &CreateAcademicYearRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AcademicYear>(&format!(
            r#"
            INSERT INTO academic_years
                (year_start, year_end, is_active, registration_start, registration_end, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.year_start)
        .bind(request.year_end)
        .bind(request.is_active)
        .bind(request.registration_start)
        .bind(request.registration_end)
        .bind(&request.description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {COLUMNS} FROM academic_years WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(year)
    }

    pub async fn find_active<'e, E: PgExecutor<'e>>(executor: E) -> Result<Option<Self>, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {COLUMNS} FROM academic_years WHERE is_active = TRUE LIMIT 1"
        ))
        .fetch_optional(executor)
        .await?;

        Ok(year)
    }

    pub async fn find_all<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let years = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {COLUMNS} FROM academic_years ORDER BY year_start DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(years)
    }

    pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM academic_years")
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        request: &UpdateAcademicYearRequest,
    ) -> Result<Option<Self>, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"
            UPDATE academic_years
            SET year_start = $2, year_end = $3, registration_start = $4,
                registration_end = $5, description = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.year_start)
        .bind(request.year_end)
        .bind(request.registration_start)
        .bind(request.registration_end)
        .bind(&request.description)
        .fetch_optional(executor)
        .await?;

        Ok(year)
    }

    /// Deletes an inactive year. Active years are left untouched; years still
    /// referenced by quotas or schedules fail with a foreign key violation.
    pub async fn delete_inactive<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM academic_years WHERE id = $1 AND is_active = FALSE")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn deactivate_all<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE academic_years SET is_active = FALSE, updated_at = NOW() WHERE is_active = TRUE",
        )
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_active_flag<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE academic_years SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
