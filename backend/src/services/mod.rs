pub mod academic_year_service;
pub mod major_service;
pub mod quota_service;
pub mod schedule_service;

pub use academic_year_service::AcademicYearService;
pub use major_service::MajorService;
pub use quota_service::QuotaService;
pub use schedule_service::ScheduleService;
