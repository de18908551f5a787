/// Student record storage
use super::{like_pattern, StudentInput};
use crate::{
    db::{self, models::Student},
    error::{AppError, AppResult},
};
use sqlx::SqlitePool;

const DUPLICATE_NIM: &str = "NIM already registered";

/// Student manager
#[derive(Clone)]
pub struct StudentManager {
    db: SqlitePool,
}

impl StudentManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List students newest first, optionally filtered by a substring of nim or nama
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Student>> {
        let students = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let pattern = like_pattern(needle);
                sqlx::query_as::<_, Student>(
                    r#"
                    SELECT id, nim, nama, created_at FROM users
                    WHERE nim LIKE ?1 ESCAPE '\' OR nama LIKE ?1 ESCAPE '\'
                    ORDER BY id DESC
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Student>(
                    "SELECT id, nim, nama, created_at FROM users ORDER BY id DESC",
                )
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(students)
    }

    pub async fn get(&self, id: i64) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT id, nim, nama, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(student)
    }

    /// Fetch or fail with 404
    pub async fn require(&self, id: i64) -> AppResult<Student> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn create(&self, input: &StudentInput) -> AppResult<Student> {
        let result = sqlx::query("INSERT INTO users (nim, nama) VALUES (?, ?)")
            .bind(&input.nim)
            .bind(&input.nama)
            .execute(&self.db)
            .await
            .map_err(|e| db::classify_write_error(e, DUPLICATE_NIM, "User not found"))?;

        self.require(result.last_insert_rowid()).await
    }

    pub async fn update(&self, id: i64, input: &StudentInput) -> AppResult<Student> {
        self.require(id).await?;

        sqlx::query("UPDATE users SET nim = ?, nama = ? WHERE id = ?")
            .bind(&input.nim)
            .bind(&input.nama)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| db::classify_write_error(e, DUPLICATE_NIM, "User not found"))?;

        self.require(id).await
    }

    /// Delete a student and every grade that references it. Returns the removed row.
    pub async fn delete(&self, id: i64) -> AppResult<Student> {
        let student = self.require(id).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM nilai WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(student)
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> StudentManager {
        let pool = db::create_memory_pool().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        StudentManager::new(pool)
    }

    fn input(nim: &str, nama: &str) -> StudentInput {
        StudentInput {
            nim: nim.to_string(),
            nama: nama.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let manager = manager().await;
        let created = manager.create(&input("A1", "Budi")).await.unwrap();

        let fetched = manager.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.nim, "A1");
        assert_eq!(fetched.nama, "Budi");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_nim_is_conflict() {
        let manager = manager().await;
        let first = manager.create(&input("A1", "Budi")).await.unwrap();

        match manager.create(&input("A1", "Sari")).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, DUPLICATE_NIM),
            other => panic!("expected conflict, got {:?}", other),
        }

        assert_eq!(manager.count().await.unwrap(), 1);
        assert_eq!(manager.get(first.id).await.unwrap().unwrap().nama, "Budi");
    }

    #[tokio::test]
    async fn test_update_conflict_and_missing() {
        let manager = manager().await;
        manager.create(&input("A1", "Budi")).await.unwrap();
        let sari = manager.create(&input("A2", "Sari")).await.unwrap();

        assert!(matches!(
            manager.update(sari.id, &input("A1", "Sari")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            manager.update(999, &input("A9", "Nobody")).await,
            Err(AppError::NotFound(_))
        ));

        let updated = manager.update(sari.id, &input("A3", "Sari W")).await.unwrap();
        assert_eq!(updated.nim, "A3");
        assert_eq!(updated.nama, "Sari W");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_searchable() {
        let manager = manager().await;
        manager.create(&input("2201001", "Budi Santoso")).await.unwrap();
        manager.create(&input("2201002", "Sari Dewi")).await.unwrap();
        manager.create(&input("2301001", "Andi")).await.unwrap();

        let all = manager.list(None).await.unwrap();
        let nims: Vec<_> = all.iter().map(|s| s.nim.as_str()).collect();
        assert_eq!(nims, vec!["2301001", "2201002", "2201001"]);

        let by_nim = manager.list(Some("2201")).await.unwrap();
        assert_eq!(by_nim.len(), 2);

        let by_nama = manager.list(Some("dewi")).await.unwrap();
        assert_eq!(by_nama.len(), 1);
        assert_eq!(by_nama[0].nama, "Sari Dewi");

        assert_eq!(manager.list(Some("   ")).await.unwrap().len(), 3);
        assert!(manager.list(Some("%")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_grades() {
        let manager = manager().await;
        let budi = manager.create(&input("A1", "Budi")).await.unwrap();

        for pertemuan in 1..=3 {
            sqlx::query("INSERT INTO nilai (user_id, pertemuan, nilai) VALUES (?, ?, 80)")
                .bind(budi.id)
                .bind(pertemuan)
                .execute(&manager.db)
                .await
                .unwrap();
        }

        let removed = manager.delete(budi.id).await.unwrap();
        assert_eq!(removed.nim, "A1");

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nilai")
            .fetch_one(&manager.db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(
            manager.delete(budi.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
