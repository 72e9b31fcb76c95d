//! Database models for the admission platform.
//!
//! Each model maps to one table and carries its own sqlx queries. Query
//! functions are generic over `PgExecutor` so repositories can run them on the
//! pool or inside a transaction.

pub mod academic_year;
pub mod major;
pub mod major_quota;
pub mod schedule;


pub use academic_year::AcademicYear;
pub use major::{Major, MajorFile};
pub use major_quota::{MajorQuota, MajorQuotaLog, NewMajorQuota, NewMajorQuotaLog};
pub use schedule::{NewSchedule, Schedule, ScheduleChanges, ScheduleNotification};

/// Offset for a one-based page number. Saturates instead of overflowing on
/// huge page numbers, which then simply read past the last row.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(0))
}
