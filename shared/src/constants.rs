// Pagination defaults
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

// Schedules
pub const DEFAULT_UPCOMING_LIMIT: i64 = 10;
pub const MIN_REMIND_BEFORE_MINUTES: i32 = 1;
pub const MAX_REMIND_BEFORE_MINUTES: i32 = 7 * 24 * 60; // one week
pub const NOTIFICATION_DELIVERY_EMAIL: &str = "email";

// Majors
pub const MAJOR_CODE_PATTERN: &str = r"^[A-Z0-9][A-Z0-9_-]{0,19}$";
pub const MAX_MAJOR_FILE_SIZE_BYTES: i64 = 5 * 1024 * 1024; // 5MB
pub const ALLOWED_MAJOR_FILE_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

// Authentication
pub const JWT_MIN_SECRET_LENGTH: usize = 32;
pub const JWT_ACCESS_TOKEN_EXPIRY_SECS: i64 = 60 * 60; // 1 hour
