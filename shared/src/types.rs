use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// User-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Staff,
    Admin,
}

impl UserRole {
    /// Whether this role satisfies a route that requires `required`.
    pub fn satisfies(&self, required: UserRole) -> bool {
        match required {
            UserRole::Student => true,
            UserRole::Staff => matches!(self, UserRole::Staff | UserRole::Admin),
            UserRole::Admin => matches!(self, UserRole::Admin),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Staff => write!(f, "staff"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

// Schedule-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Registration,
    Test,
    Interview,
    Announcement,
    Enrollment,
    Other,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Registration => "registration",
            ScheduleType::Test => "test",
            ScheduleType::Interview => "interview",
            ScheduleType::Announcement => "announcement",
            ScheduleType::Enrollment => "enrollment",
            ScheduleType::Other => "other",
        }
    }
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(ScheduleType::Registration),
            "test" => Ok(ScheduleType::Test),
            "interview" => Ok(ScheduleType::Interview),
            "announcement" => Ok(ScheduleType::Announcement),
            "enrollment" => Ok(ScheduleType::Enrollment),
            "other" => Ok(ScheduleType::Other),
            _ => Err(format!("invalid schedule type: {}", s)),
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
        }
    }
}

impl Default for PriorityLevel {
    fn default() -> Self {
        PriorityLevel::Medium
    }
}

impl FromStr for PriorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(PriorityLevel::High),
            "medium" => Ok(PriorityLevel::Medium),
            "low" => Ok(PriorityLevel::Low),
            _ => Err(format!("invalid priority level: {}", s)),
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
        }
    }
}

// Quota audit enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quota_action_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotaActionType {
    Create,
    Update,
    Increase,
    Decrease,
    Reset,
}

impl fmt::Display for QuotaActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaActionType::Create => write!(f, "CREATE"),
            QuotaActionType::Update => write!(f, "UPDATE"),
            QuotaActionType::Increase => write!(f, "INCREASE"),
            QuotaActionType::Decrease => write!(f, "DECREASE"),
            QuotaActionType::Reset => write!(f, "RESET"),
        }
    }
}

// Major attachment enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Brochure,
    Syllabus,
    Curriculum,
    Other,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Brochure => write!(f, "brochure"),
            FileType::Syllabus => write!(f, "syllabus"),
            FileType::Curriculum => write!(f, "curriculum"),
            FileType::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_type_parses_known_values_only() {
        assert_eq!("interview".parse::<ScheduleType>(), Ok(ScheduleType::Interview));
        assert!("meeting".parse::<ScheduleType>().is_err());
        assert!("Test".parse::<ScheduleType>().is_err());
    }

    #[test]
    fn priority_level_defaults_to_medium() {
        assert_eq!(PriorityLevel::default(), PriorityLevel::Medium);
        assert!("urgent".parse::<PriorityLevel>().is_err());
    }

    #[test]
    fn quota_action_serializes_uppercase() {
        let json = serde_json::to_string(&QuotaActionType::Increase).unwrap();
        assert_eq!(json, "\"INCREASE\"");
    }

    #[test]
    fn admin_satisfies_every_role() {
        assert!(UserRole::Admin.satisfies(UserRole::Staff));
        assert!(UserRole::Staff.satisfies(UserRole::Student));
        assert!(!UserRole::Staff.satisfies(UserRole::Admin));
        assert!(!UserRole::Student.satisfies(UserRole::Staff));
    }
}
