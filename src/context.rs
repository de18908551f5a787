/// Application context and dependency injection
use crate::{
    admin::{ActivityLogger, AdminManager, SeedOutcome},
    auth::TokenIssuer,
    config::ServerConfig,
    dashboard::Dashboard,
    db,
    error::AppResult,
    grade::GradeManager,
    student::StudentManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub tokens: TokenIssuer,
    pub admins: AdminManager,
    pub students: StudentManager,
    pub grades: GradeManager,
    pub dashboard: Dashboard,
    pub activity: ActivityLogger,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool =
            db::create_pool(&config.storage.database_path, db::DatabaseOptions::default()).await?;

        Self::with_pool(config, pool).await
    }

    /// Build the context on an existing pool. Migrations and the superadmin
    /// seed run here, so this is also the entry point for tests.
    pub async fn with_pool(config: ServerConfig, pool: SqlitePool) -> AppResult<Self> {
        config.validate()?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let admins = AdminManager::new(pool.clone());
        let bootstrap = &config.bootstrap;
        match admins
            .ensure_superadmin(&bootstrap.superadmin_username, &bootstrap.superadmin_password)
            .await?
        {
            SeedOutcome::Created => {
                tracing::info!("Created superadmin account '{}'", bootstrap.superadmin_username)
            }
            SeedOutcome::Promoted => tracing::info!(
                "Promoted existing admin '{}' to superadmin",
                bootstrap.superadmin_username
            ),
            SeedOutcome::Unchanged | SeedOutcome::Skipped => {}
        }

        let tokens = TokenIssuer::new(
            &config.authentication.jwt_secret,
            chrono::Duration::hours(config.authentication.token_ttl_hours),
        );

        Ok(Self {
            tokens,
            admins,
            students: StudentManager::new(pool.clone()),
            grades: GradeManager::new(pool.clone()),
            dashboard: Dashboard::new(pool.clone()),
            activity: ActivityLogger::spawn(pool.clone()),
            db: pool,
            config: Arc::new(config),
        })
    }

    /// Drain pending activity writes, then checkpoint and close the database
    pub async fn shutdown(&self) -> AppResult<()> {
        self.activity.flush().await;
        db::shutdown(&self.db).await
    }

    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        tokio::fs::create_dir_all(&config.storage.data_directory).await?;

        if let Some(parent) = config.storage.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if config.backup.enabled {
            tokio::fs::create_dir_all(&config.backup.backup_dir).await?;
        }

        Ok(())
    }
}
