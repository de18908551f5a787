/// Student records (the `users` resource)
mod manager;

pub use manager::StudentManager;

use crate::{
    error::{AppError, AppResult},
    validation,
};
use serde::{Deserialize, Serialize};

/// Create/update request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPayload {
    pub nim: Option<String>,
    pub nama: Option<String>,
}

/// Validated, trimmed student fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub nim: String,
    pub nama: String,
}

impl StudentPayload {
    pub fn validate(&self) -> AppResult<StudentInput> {
        match (
            validation::trimmed(self.nim.as_deref()),
            validation::trimmed(self.nama.as_deref()),
        ) {
            (Some(nim), Some(nama)) => Ok(StudentInput { nim, nama }),
            _ => Err(AppError::Validation("NIM and nama are required".to_string())),
        }
    }
}

/// `?search=` query for the student list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
    pub search: Option<String>,
}

/// Build a `LIKE` pattern matching `needle` as a literal substring.
/// Pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
