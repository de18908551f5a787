/// Input validation rules
///
/// Every check returns `AppError::Validation` with a message naming the
/// constraint that failed, so handlers can surface it verbatim.
use crate::error::{AppError, AppResult};
use serde_json::Value;
use std::ops::RangeInclusive;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PERTEMUAN_RANGE: RangeInclusive<i64> = 1..=16;
pub const NILAI_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Trimmed value, or `None` when absent or blank
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Password must be present and at least `MIN_PASSWORD_LEN` characters
pub fn password(value: Option<&str>) -> AppResult<&str> {
    let password = value
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(password)
}

/// A JSON value that was not supplied (absent, null or an empty string)
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Read a JSON number or a numeric string
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Read a JSON number or numeric string that holds an integer
pub fn integer(value: &Value) -> Option<i64> {
    let n = number(value)?;
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Session number must be an integer in 1..=16
pub fn pertemuan(value: &Value) -> AppResult<i64> {
    integer(value)
        .filter(|p| PERTEMUAN_RANGE.contains(p))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Pertemuan must be an integer between {} and {}",
                PERTEMUAN_RANGE.start(),
                PERTEMUAN_RANGE.end()
            ))
        })
}

/// Grade value must be numeric in 0..=100
pub fn nilai(value: &Value) -> AppResult<f64> {
    number(value)
        .filter(|n| NILAI_RANGE.contains(n))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Nilai must be between {} and {}",
                NILAI_RANGE.start(),
                NILAI_RANGE.end()
            ))
        })
}

/// Parse an optional `pertemuan` query filter; empty means no filter
pub fn pertemuan_filter(raw: Option<&str>) -> AppResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation("Pertemuan filter must be an integer".to_string())),
    }
}
