use std::fmt;

pub const CURRENCY_CODE_LEN: usize = 3;
pub const REFERENCE_ID_MAX_LEN: usize = 32;
pub const SELLER_NOTE_MAX_LEN: usize = 1024;
pub const ALLOWED_REGIONS: &[&str] = &["us", "uk", "de", "jp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Collapses whitespace (tabs and newlines included) to single spaces and
/// drops other control characters.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter_map(|ch| match ch {
            ch if ch.is_whitespace() => Some(' '),
            ch if ch.is_control() => None,
            ch => Some(ch),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_currency_code(currency: &str) -> ValidationResult {
    let currency = sanitize_string(currency);
    validate_required("currency", &currency)?;

    if currency.len() != CURRENCY_CODE_LEN || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "must be a three letter uppercase ISO 4217 code",
        ));
    }

    Ok(())
}

/// Reference ids are echoed back by the remote API and limited to 32
/// alphanumeric, `-` or `_` characters.
pub fn validate_reference_id(reference_id: &str) -> ValidationResult {
    validate_required("reference_id", reference_id)?;
    validate_max_len("reference_id", reference_id, REFERENCE_ID_MAX_LEN)?;

    if !reference_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ValidationError::new(
            "reference_id",
            "must contain only letters, digits, '-' or '_'",
        ));
    }

    Ok(())
}

pub fn validate_non_negative_cents(field: &'static str, cents: i64) -> ValidationResult {
    if cents < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(())
}

pub fn validate_base_url(field: &'static str, value: &str) -> ValidationResult {
    validate_required(field, value)?;
    let parsed = url::Url::parse(value)
        .map_err(|e| ValidationError::new(field, format!("is not a valid URL: {}", e)))?;

    if parsed.host_str().is_none() {
        return Err(ValidationError::new(field, "must include a host"));
    }

    Ok(())
}
