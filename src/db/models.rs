/// Row models shared by the managers and the HTTP layer
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Student record (`users` table)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub nim: String,
    pub nama: String,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: NaiveDateTime,
}

/// Grade entry joined with its owning student
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct GradeRow {
    pub id: i64,
    pub user_id: i64,
    pub nim: String,
    pub nama: String,
    pub pertemuan: i64,
    pub nilai: f64,
    pub notes: String,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: NaiveDateTime,
}

/// Activity log entry
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub admin_username: String,
    pub action: String,
    pub detail: Option<String>,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: NaiveDateTime,
}

/// Number of students created on one day
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// Timestamps are kept in SQLite's `CURRENT_TIMESTAMP` text form on the wire too
pub mod sqlite_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
