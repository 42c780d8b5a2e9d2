use crate::utils::error::{AppError, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

static ESIID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{17,22}$").unwrap());

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

// Request-side checks below return ValidationError so handlers answer 400.

/// Trims a free-text query parameter and enforces its length bounds.
pub fn sanitize_query(field_name: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field_name, "must not be empty"));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::validation(
            field_name,
            format!("must be at most {} characters", max_len),
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(AppError::validation(field_name, "contains control characters"));
    }
    Ok(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Street addresses may carry letters, digits, spaces and a small set of punctuation.
pub fn sanitize_address(value: &str) -> Result<String> {
    let cleaned = sanitize_query("address", value, 200)?;
    if cleaned.len() < 5 {
        return Err(AppError::validation("address", "is too short"));
    }
    if let Some(bad) = cleaned
        .chars()
        .find(|c| !(c.is_alphanumeric() || " #.,-'/&".contains(*c)))
    {
        return Err(AppError::validation(
            "address",
            format!("contains unsupported character '{}'", bad),
        ));
    }
    Ok(cleaned)
}

pub fn validate_esiid(value: &str) -> Result<()> {
    if ESIID_RE.is_match(value) {
        Ok(())
    } else {
        Err(AppError::validation("esiid", "must be 17 to 22 digits"))
    }
}

pub fn validate_limit(field_name: &str, value: Option<usize>, default: usize, max: usize) -> Result<usize> {
    match value {
        None => Ok(default),
        Some(0) => Err(AppError::validation(field_name, "must be at least 1")),
        Some(v) if v > max => Err(AppError::validation(
            field_name,
            format!("must be at most {}", max),
        )),
        Some(v) => Ok(v),
    }
}
