/// Activity log: an append-only audit trail written off the request path
use crate::{db::models::ActivityEntry, error::AppResult};
use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Action tags stored in `activity_log.action`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Login,
    Create,
    Update,
    Delete,
    CreateNilai,
    UpdateNilai,
    DeleteNilai,
    CreateAdmin,
    ResetPassword,
    DeleteAdmin,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "LOGIN",
            ActivityAction::Create => "CREATE",
            ActivityAction::Update => "UPDATE",
            ActivityAction::Delete => "DELETE",
            ActivityAction::CreateNilai => "CREATE_NILAI",
            ActivityAction::UpdateNilai => "UPDATE_NILAI",
            ActivityAction::DeleteNilai => "DELETE_NILAI",
            ActivityAction::CreateAdmin => "CREATE_ADMIN",
            ActivityAction::ResetPassword => "RESET_PW",
            ActivityAction::DeleteAdmin => "DELETE_ADMIN",
        }
    }
}

#[derive(Debug)]
struct NewActivity {
    admin_username: String,
    action: ActivityAction,
    detail: String,
}

#[derive(Debug)]
enum Command {
    Record(NewActivity),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background activity writer.
///
/// `record` never blocks and never fails the caller; a failed insert is
/// logged and dropped.
#[derive(Clone)]
pub struct ActivityLogger {
    tx: mpsc::UnboundedSender<Command>,
}

impl ActivityLogger {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(db: SqlitePool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(db, rx));
        Self { tx }
    }

    pub fn record(&self, admin_username: &str, action: ActivityAction, detail: impl Into<String>) {
        let entry = NewActivity {
            admin_username: admin_username.to_string(),
            action,
            detail: detail.into(),
        };

        if self.tx.send(Command::Record(entry)).is_err() {
            warn!("Activity writer stopped; dropping {} entry", action.as_str());
        }
    }

    /// Wait until everything recorded so far has been written (or dropped)
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    async fn run(db: SqlitePool, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Record(entry) => {
                    if let Err(e) = insert(&db, &entry).await {
                        warn!(
                            "Failed to write activity {} for {}: {}",
                            entry.action.as_str(),
                            entry.admin_username,
                            e
                        );
                    }
                }
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        debug!("Activity writer stopped");
    }
}

async fn insert(db: &SqlitePool, entry: &NewActivity) -> AppResult<()> {
    sqlx::query("INSERT INTO activity_log (admin_username, action, detail) VALUES (?, ?, ?)")
        .bind(&entry.admin_username)
        .bind(entry.action.as_str())
        .bind(&entry.detail)
        .execute(db)
        .await?;

    Ok(())
}

/// Most recent entries, newest first
pub async fn recent(db: &SqlitePool, limit: i64) -> AppResult<Vec<ActivityEntry>> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        "SELECT id, admin_username, action, detail, created_at FROM activity_log ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn pool() -> SqlitePool {
        let pool = db::create_memory_pool().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_record_then_flush_persists_in_order() {
        let pool = pool().await;
        let logger = ActivityLogger::spawn(pool.clone());

        logger.record("Fann", ActivityAction::Login, "Logged in");
        logger.record("Fann", ActivityAction::Create, "Added student Budi (A1)");
        logger.flush().await;

        let entries = recent(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "CREATE");
        assert_eq!(entries[0].detail.as_deref(), Some("Added student Budi (A1)"));
        assert_eq!(entries[1].action, "LOGIN");
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let pool = pool().await;
        let logger = ActivityLogger::spawn(pool.clone());

        sqlx::query("DROP TABLE activity_log")
            .execute(&pool)
            .await
            .unwrap();

        logger.record("Fann", ActivityAction::Delete, "nothing to see");
        logger.flush().await;

        // The writer survives the failure and keeps acknowledging
        logger.record("Fann", ActivityAction::Delete, "still alive");
        logger.flush().await;
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let pool = pool().await;
        let logger = ActivityLogger::spawn(pool.clone());

        for i in 0..15 {
            logger.record("Fann", ActivityAction::Update, format!("entry {}", i));
        }
        logger.flush().await;

        let entries = recent(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].detail.as_deref(), Some("entry 14"));
    }

    #[test]
    fn test_action_tags() {
        assert_eq!(ActivityAction::ResetPassword.as_str(), "RESET_PW");
        assert_eq!(ActivityAction::CreateNilai.as_str(), "CREATE_NILAI");
    }
}
