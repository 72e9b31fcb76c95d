use admission_shared::{ALLOWED_MAJOR_FILE_MIME_TYPES, MAJOR_CODE_PATTERN, MAX_MAJOR_FILE_SIZE_BYTES};
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// Run derive-based validation and convert failures into `AppError::Validation`.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(validation_errors_to_app_error)
}

/// Major codes are short upper-case identifiers such as `TKJ` or `RPL-2`.
pub fn validate_major_code(code: &str) -> Result<(), ValidationError> {
    let matches = Regex::new(MAJOR_CODE_PATTERN)
        .map(|re| re.is_match(code))
        .unwrap_or(false);

    if !matches {
        return Err(ValidationError::new("invalid_major_code"));
    }

    Ok(())
}

pub fn validate_major_file(mime_type: &str, file_size: i64) -> Result<(), ValidationError> {
    if !ALLOWED_MAJOR_FILE_MIME_TYPES.contains(&mime_type) {
        return Err(ValidationError::new("unsupported_mime_type"));
    }

    if file_size <= 0 || file_size > MAX_MAJOR_FILE_SIZE_BYTES {
        return Err(ValidationError::new("file_too_large"));
    }

    Ok(())
}

/// Trims a search keyword; blank keywords mean "no filter".
pub fn normalize_keyword(keyword: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };

    if keyword.chars().count() > 100 {
        return Err(AppError::Validation("keyword: Search keyword is too long".to_string()));
    }

    Ok(Some(keyword.to_string()))
}

fn describe(code: &str) -> &'static str {
    match code {
        "length" => "Invalid length",
        "range" => "Value out of range",
        "required" => "Field is required",
        "invalid_major_code" => "Major code must be upper-case letters, digits, '-' or '_'",
        "unsupported_mime_type" => "File type is not allowed",
        "file_too_large" => "File exceeds the maximum size",
        _ => "Validation error",
    }
}

/// Flatten validator output into one message, fields in alphabetical order.
pub fn validation_errors_to_app_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors
                .iter()
                .map(move |error| format!("{}: {}", field, describe(error.code.as_ref())))
        })
        .collect();

    AppError::Validation(messages.join(", "))
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        validation_errors_to_app_error(errors)
    }
}

/// Wrap a single field-level failure the same way derive validation reports it.
pub fn field_error(field: &'static str, error: ValidationError) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    validation_errors_to_app_error(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_shared::CreateMajorQuotaRequest;
    use uuid::Uuid;

    #[test]
    fn major_code_format() {
        assert!(validate_major_code("TKJ").is_ok());
        assert!(validate_major_code("RPL-2").is_ok());
        assert!(validate_major_code("tkj").is_err());
        assert!(validate_major_code("").is_err());
        assert!(validate_major_code("-TKJ").is_err());
    }

    #[test]
    fn major_file_limits() {
        assert!(validate_major_file("application/pdf", 1024).is_ok());
        assert!(validate_major_file("application/x-msdownload", 1024).is_err());
        assert!(validate_major_file("application/pdf", MAX_MAJOR_FILE_SIZE_BYTES + 1).is_err());
    }

    #[test]
    fn blank_keyword_is_no_filter() {
        assert_eq!(normalize_keyword(None).unwrap(), None);
        assert_eq!(normalize_keyword(Some("   ")).unwrap(), None);
        assert_eq!(normalize_keyword(Some(" eng ")).unwrap(), Some("eng".to_string()));
        assert!(normalize_keyword(Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn derive_errors_become_validation_error() {
        let request = CreateMajorQuotaRequest {
            academic_year_id: Uuid::new_v4(),
            major_id: Uuid::new_v4(),
            total_quota: -5,
            notes: None,
        };

        match validate_request(&request) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "total_quota: Value out of range"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
