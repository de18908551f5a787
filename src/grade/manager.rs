/// Grade entry storage
use super::GradeInput;
use crate::{
    db::{self, models::GradeRow},
    error::{AppError, AppResult},
    student::like_pattern,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT_JOINED: &str = r#"
    SELECT n.id, n.user_id, u.nim, u.nama, n.pertemuan, n.nilai, n.notes, n.created_at
    FROM nilai n JOIN users u ON n.user_id = u.id
"#;

/// Grade manager
#[derive(Clone)]
pub struct GradeManager {
    db: SqlitePool,
}

impl GradeManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List grades by session ascending, newest first within a session.
    ///
    /// `search` matches a substring of nim, nama or notes; `pertemuan` is exact.
    pub async fn list(&self, search: Option<&str>, pertemuan: Option<i64>) -> AppResult<Vec<GradeRow>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_JOINED);
        query.push(" WHERE 1=1");

        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(needle);
            query
                .push(r" AND (u.nim LIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR u.nama LIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR n.notes LIKE ")
                .push_bind(pattern)
                .push(r" ESCAPE '\')");
        }

        if let Some(pertemuan) = pertemuan {
            query.push(" AND n.pertemuan = ").push_bind(pertemuan);
        }

        query.push(" ORDER BY n.pertemuan ASC, n.id DESC");

        let rows = query.build_query_as::<GradeRow>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> AppResult<Option<GradeRow>> {
        let row = sqlx::query_as::<_, GradeRow>(&format!("{} WHERE n.id = ?", SELECT_JOINED))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row)
    }

    /// Fetch or fail with 404
    pub async fn require(&self, id: i64) -> AppResult<GradeRow> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Nilai not found".to_string()))
    }

    pub async fn create(&self, input: &GradeInput) -> AppResult<GradeRow> {
        self.require_student(input.user_id).await?;

        let result = sqlx::query(
            "INSERT INTO nilai (user_id, pertemuan, nilai, notes) VALUES (?, ?, ?, ?)",
        )
        .bind(input.user_id)
        .bind(input.pertemuan)
        .bind(input.nilai)
        .bind(&input.notes)
        .execute(&self.db)
        .await
        .map_err(|e| db::classify_write_error(e, &duplicate_session(input.pertemuan), "User not found"))?;

        self.require(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: &GradeInput) -> AppResult<GradeRow> {
        self.require(id).await?;
        self.require_student(input.user_id).await?;

        sqlx::query("UPDATE nilai SET user_id = ?, pertemuan = ?, nilai = ?, notes = ? WHERE id = ?")
            .bind(input.user_id)
            .bind(input.pertemuan)
            .bind(input.nilai)
            .bind(&input.notes)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                db::classify_write_error(e, &duplicate_session(input.pertemuan), "User not found")
            })?;

        self.require(id).await
    }

    /// Delete a grade. Returns the removed row.
    pub async fn delete(&self, id: i64) -> AppResult<GradeRow> {
        let row = self.require(id).await?;

        sqlx::query("DELETE FROM nilai WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(row)
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM nilai")
            .fetch_one(&self.db)
            .await?)
    }

    /// Mean of all grade values, `None` when there are no grades
    pub async fn average(&self) -> AppResult<Option<f64>> {
        Ok(sqlx::query_scalar("SELECT AVG(nilai) FROM nilai")
            .fetch_one(&self.db)
            .await?)
    }

    async fn require_student(&self, user_id: i64) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

fn duplicate_session(pertemuan: i64) -> String {
    format!(
        "A grade for pertemuan {} already exists for this student",
        pertemuan
    )
}
