/// On-disk database snapshots
///
/// Each run writes a consistent copy of the live database with `VACUUM INTO`
/// and keeps only the newest `retain` snapshots in the backup directory.
use crate::{config::BackupConfig, error::AppResult};
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SNAPSHOT_PREFIX: &str = "nilai-";
const SNAPSHOT_SUFFIX: &str = ".sqlite";

/// Writes and prunes snapshots
#[derive(Clone)]
pub struct BackupManager {
    db: SqlitePool,
    backup_dir: PathBuf,
    retain: usize,
}

impl BackupManager {
    pub fn new(db: SqlitePool, config: &BackupConfig) -> Self {
        Self {
            db,
            backup_dir: config.backup_dir.clone(),
            retain: config.retain,
        }
    }

    /// Write a snapshot and prune old ones. Returns the new snapshot path.
    pub async fn run_backup(&self) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.backup_dir).await?;

        let path = self.backup_dir.join(snapshot_name(Utc::now()));
        sqlx::query("VACUUM INTO ?")
            .bind(path.to_string_lossy().into_owned())
            .execute(&self.db)
            .await?;

        info!("Wrote database snapshot {:?}", path);

        let removed = self.prune().await?;
        if removed > 0 {
            info!("Removed {} old snapshot(s)", removed);
        }

        Ok(path)
    }

    /// Snapshots in the backup directory, newest first
    pub async fn list(&self) -> AppResult<Vec<PathBuf>> {
        list_snapshots(&self.backup_dir).await
    }

    async fn prune(&self) -> AppResult<usize> {
        let mut removed = 0;

        for stale in self.list().await?.into_iter().skip(self.retain) {
            match tokio::fs::remove_file(&stale).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove old snapshot {:?}: {}", stale, e),
            }
        }

        Ok(removed)
    }
}

/// Millisecond precision keeps names unique and lexically ordered by time
fn snapshot_name(at: chrono::DateTime<Utc>) -> String {
    format!(
        "{}{}{}",
        SNAPSHOT_PREFIX,
        at.format("%Y%m%d-%H%M%S-%3f"),
        SNAPSHOT_SUFFIX
    )
}

fn is_snapshot(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_SUFFIX))
}

async fn list_snapshots(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !tokio::fs::try_exists(dir).await? {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_snapshot(&path) {
            snapshots.push(path);
        }
    }

    snapshots.sort();
    snapshots.reverse();
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;

    /// Snapshots go to `dir`; the live database sits next to it
    async fn manager(dir: &Path, retain: usize) -> BackupManager {
        let live = dir.parent().unwrap().join("live.sqlite");
        let pool = db::create_pool(&live, db::DatabaseOptions::default())
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (nim, nama) VALUES ('A1', 'Budi')")
            .execute(&pool)
            .await
            .unwrap();

        let config = BackupConfig {
            enabled: true,
            interval_hours: 24,
            backup_dir: dir.to_path_buf(),
            retain,
        };
        BackupManager::new(pool, &config)
    }

    #[test]
    fn test_snapshot_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(snapshot_name(at), "nilai-20260309-070501-000.sqlite");
        assert!(is_snapshot(Path::new("/tmp/nilai-20260309-070501-000.sqlite")));
        assert!(!is_snapshot(Path::new("/tmp/notes.txt")));
    }

    #[tokio::test]
    async fn test_snapshot_contains_data() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("backups");
        let manager = manager(&dir, 3).await;

        let path = manager.run_backup().await.unwrap();
        assert!(path.exists());

        let copy = db::create_pool(&path, db::DatabaseOptions::default())
            .await
            .unwrap();
        let nim: String = sqlx::query_scalar("SELECT nim FROM users")
            .fetch_one(&copy)
            .await
            .unwrap();
        assert_eq!(nim, "A1");
    }

    #[tokio::test]
    async fn test_prunes_to_retain_count() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("backups");
        std::fs::create_dir_all(&dir).unwrap();
        for name in [
            "nilai-20200101-000000-000.sqlite",
            "nilai-20200102-000000-000.sqlite",
            "nilai-20200103-000000-000.sqlite",
        ] {
            std::fs::write(dir.join(name), b"old").unwrap();
        }
        std::fs::write(dir.join("keep-me.txt"), b"unrelated").unwrap();

        let manager = manager(&dir, 2).await;
        let newest = manager.run_backup().await.unwrap();

        let remaining = manager.list().await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0], newest);
        assert!(remaining[1].ends_with("nilai-20200103-000000-000.sqlite"));
        assert!(dir.join("keep-me.txt").exists());
        assert!(!root.path().join("backups/nilai-20200101-000000-000.sqlite").exists());
    }

    #[tokio::test]
    async fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = list_snapshots(&dir.path().join("absent")).await.unwrap();
        assert!(snapshots.is_empty());
    }
}
