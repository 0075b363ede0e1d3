use crate::utils::error::{LogHubError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> LogHubError {
    LogHubError::InvalidConfigValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// API servers must be absolute http(s) URLs.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(field_name, value, format!("Value must be at least {}", min_value)));
    }
    Ok(())
}

/// Job inputs are matched case-insensitively, so `Orders.CSV` is accepted.
pub fn validate_file_extensions<'a, I>(
    field_name: &str,
    files: I,
    allowed_extensions: &[&str],
) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for file in files {
        let extension = Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| invalid(field_name, file, "File has no extension"))?;
        if !allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
        {
            return Err(invalid(
                field_name,
                file,
                format!(
                    "Unsupported file extension: {}. Allowed extensions: {}",
                    extension,
                    allowed_extensions.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| LogHubError::MissingConfig {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
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
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_server", "https://example.com").is_ok());
        assert!(validate_url("api_server", "http://example.com").is_ok());
        assert!(validate_url("api_server", "").is_err());
        assert!(validate_url("api_server", "invalid-url").is_err());
        assert!(validate_url("api_server", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("retry.max_attempts", 3, 1).is_ok());
        assert!(validate_positive_number("retry.max_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        assert!(validate_file_extensions("job.inputs", ["addresses.csv"], &["csv"]).is_ok());
        assert!(validate_file_extensions("job.inputs", ["Addresses.CSV"], &["csv"]).is_ok());
        assert!(validate_file_extensions("job.inputs", ["addresses.xlsx"], &["csv"]).is_err());
        assert!(validate_file_extensions("job.inputs", ["addresses"], &["csv"]).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let email: Option<String> = None;
        let err = validate_required_field("dataset.email", &email).unwrap_err();
        assert!(matches!(err, LogHubError::MissingConfig { .. }));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("retry.max_attempts", 3u32, 1, 10).is_ok());
        assert!(validate_range("retry.max_attempts", 11u32, 1, 10).is_err());
    }
}
