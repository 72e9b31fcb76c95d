//! Storage abstractions for the admission domain.
//!
//! Each store is an `async_trait` with a Postgres implementation that
//! delegates to the model queries, plus a shared in-memory implementation.

use sqlx::PgPool;
use std::sync::Arc;

pub mod academic_year_repository;
pub mod major_repository;
pub mod memory;
pub mod notification_repository;
pub mod quota_repository;
pub mod schedule_repository;

#[cfg(test)]
mod tests;

pub use academic_year_repository::{AcademicYearRepository, PgAcademicYearRepository};
pub use major_repository::{MajorRepository, PgMajorRepository};
pub use memory::MemoryStore;
pub use notification_repository::{NotificationRepository, PgNotificationRepository};
pub use quota_repository::{PgQuotaRepository, QuotaRepository};
pub use schedule_repository::{PgScheduleRepository, ScheduleRepository};

/// Repository container handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub academic_years: Arc<dyn AcademicYearRepository>,
    pub majors: Arc<dyn MajorRepository>,
    pub quotas: Arc<dyn QuotaRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            academic_years: Arc::new(PgAcademicYearRepository::new(pool.clone())),
            majors: Arc::new(PgMajorRepository::new(pool.clone())),
            quotas: Arc::new(PgQuotaRepository::new(pool.clone())),
            schedules: Arc::new(PgScheduleRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }

    /// All repositories backed by one shared `MemoryStore`.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            academic_years: store.clone(),
            majors: store.clone(),
            quotas: store.clone(),
            schedules: store.clone(),
            notifications: store,
        }
    }
}
