/// Per-session grade entries (the `nilai` resource)
mod manager;

pub use manager::GradeManager;

use crate::{
    error::{AppError, AppResult},
    validation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create/update request body.
///
/// Numeric fields arrive either as JSON numbers or as numeric strings from
/// HTML forms, so they are kept loose until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradePayload {
    pub user_id: Option<Value>,
    pub pertemuan: Option<Value>,
    pub nilai: Option<Value>,
    pub notes: Option<String>,
}

/// Validated grade fields
#[derive(Debug, Clone, PartialEq)]
pub struct GradeInput {
    pub user_id: i64,
    pub pertemuan: i64,
    pub nilai: f64,
    pub notes: String,
}

impl GradePayload {
    pub fn validate(&self) -> AppResult<GradeInput> {
        let missing_user = validation::is_blank(self.user_id.as_ref())
            || self
                .user_id
                .as_ref()
                .and_then(validation::number)
                .is_some_and(|id| id == 0.0);

        let (Some(user_id), Some(pertemuan), Some(nilai)) = (
            self.user_id.as_ref().filter(|_| !missing_user),
            self.pertemuan
                .as_ref()
                .filter(|v| !validation::is_blank(Some(*v))),
            self.nilai
                .as_ref()
                .filter(|v| !validation::is_blank(Some(*v))),
        ) else {
            return Err(AppError::Validation(
                "User, pertemuan and nilai are required".to_string(),
            ));
        };

        let nilai = validation::nilai(nilai)?;
        let pertemuan = validation::pertemuan(pertemuan)?;
        let user_id = validation::integer(user_id)
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Validation("user_id must be a positive integer".to_string()))?;

        Ok(GradeInput {
            user_id,
            pertemuan,
            nilai,
            notes: self.notes.as_deref().unwrap_or_default().trim().to_string(),
        })
    }
}

/// `?search=&pertemuan=` query for the grade list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeQuery {
    pub search: Option<String>,
    pub pertemuan: Option<String>,
}
