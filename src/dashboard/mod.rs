/// Dashboard aggregation
///
/// A read-only composition of counts, the grade average, the recent activity
/// feed and a seven-day histogram of student creation. Calendar days follow
/// the server's local time zone.
use crate::{
    admin::activity,
    db::models::{ActivityEntry, DailyCount},
    error::AppResult,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Entries shown in the recent activity feed
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;
/// Days covered by the creation histogram, today included
pub const CHART_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_nilai: i64,
    pub today_users: i64,
    /// One decimal place, or "0" when there are no grades
    pub avg_nilai: String,
    pub recent_activity: Vec<ActivityEntry>,
    /// Days without new students are absent rather than zero
    pub chart_data: Vec<DailyCount>,
}

#[derive(Clone)]
pub struct Dashboard {
    db: SqlitePool,
}

impl Dashboard {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let (total_users, total_admins, total_nilai, today_users, avg): (
            i64,
            i64,
            i64,
            i64,
            Option<f64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM admins),
                (SELECT COUNT(*) FROM nilai),
                (SELECT COUNT(*) FROM users
                    WHERE date(created_at, 'localtime') = date('now', 'localtime')),
                (SELECT AVG(nilai) FROM nilai)
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let recent_activity = activity::recent(&self.db, RECENT_ACTIVITY_LIMIT).await?;

        let chart_data = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT date(created_at, 'localtime') AS date, COUNT(*) AS count
            FROM users
            WHERE date(created_at, 'localtime') >= date('now', 'localtime', ?)
            GROUP BY date(created_at, 'localtime')
            ORDER BY date ASC
            "#,
        )
        .bind(format!("-{} days", CHART_DAYS - 1))
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardStats {
            total_users,
            total_admins,
            total_nilai,
            today_users,
            avg_nilai: format_average(avg),
            recent_activity,
            chart_data,
        })
    }
}

/// Round half away from zero to one decimal; "0" when there is nothing to average
pub fn format_average(avg: Option<f64>) -> String {
    match avg {
        Some(value) => format!("{:.1}", (value * 10.0).round() / 10.0),
        None => "0".to_string(),
    }
}
