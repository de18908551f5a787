/// Background jobs
///
/// Periodic tasks spawned next to the HTTP server: a database health check
/// and, when enabled, database snapshots.
use crate::{backup::BackupManager, context::AppContext, db};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        let backup = &self.context.config.backup;
        if backup.enabled {
            info!(
                "Database snapshots every {} hour(s), keeping {}",
                backup.interval_hours, backup.retain
            );
            tokio::spawn(Self::backup_job(Arc::clone(&self)));
        } else {
            info!("Database snapshots are disabled");
        }

        info!("Background jobs started");
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(HEALTH_CHECK_INTERVAL);

        loop {
            interval.tick().await;

            if let Err(e) = db::test_connection(&scheduler.context.db).await {
                error!("Health check failed: {}", e);
            }
        }
    }

    /// Snapshot job; the first run happens at startup
    async fn backup_job(scheduler: Arc<Self>) {
        let config = &scheduler.context.config.backup;
        let manager = BackupManager::new(scheduler.context.db.clone(), config);
        let mut interval = interval(Duration::from_secs(config.interval_hours * 3600));

        loop {
            interval.tick().await;

            match manager.run_backup().await {
                Ok(path) => info!("Scheduled snapshot completed: {:?}", path),
                Err(e) => error!("Scheduled snapshot failed: {}", e),
            }
        }
    }
}
