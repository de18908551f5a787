/// Configuration management for the nilai dashboard
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Secret used when NILAI_JWT_SECRET is not set. Fine for local runs only.
pub const DEVELOPMENT_JWT_SECRET: &str = "nilai-dashboard-development-secret-change-me";

/// Upper bound for the token lifetime and the snapshot interval (one year)
pub const MAX_HOURS: i64 = 24 * 365;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub bootstrap: BootstrapConfig,
    pub backup: BackupConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Allowed CORS origins, `*` means any
    pub cors_origins: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database_path: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// Superadmin account seeded on first boot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub superadmin_username: String,
    pub superadmin_password: String,
}

/// Snapshot backup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    pub enabled: bool,
    pub interval_hours: u64,
    pub backup_dir: PathBuf,
    /// Number of snapshots to keep
    pub retain: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let data_directory = PathBuf::from("./data");
        Self {
            service: ServiceConfig {
                hostname: "0.0.0.0".to_string(),
                port: 3001,
                cors_origins: vec!["*".to_string()],
            },
            storage: StorageConfig {
                database_path: data_directory.join("database.sqlite"),
                data_directory: data_directory.clone(),
            },
            authentication: AuthConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                token_ttl_hours: 24,
            },
            bootstrap: BootstrapConfig {
                superadmin_username: "Fann".to_string(),
                superadmin_password: "admin".to_string(),
            },
            backup: BackupConfig {
                enabled: false,
                interval_hours: 24,
                backup_dir: data_directory.join("backups"),
                retain: 7,
            },
            logging: LoggingConfig {
                level: "nilai_dashboard=debug,tower_http=debug".to_string(),
                json: false,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let hostname = env::var("NILAI_HOSTNAME").unwrap_or(defaults.service.hostname);
        let port = match env::var("NILAI_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation("Invalid port number".to_string()))?,
            Err(_) => defaults.service.port,
        };
        let cors_origins = env::var("NILAI_CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.service.cors_origins);

        let data_directory: PathBuf = env::var("NILAI_DATA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_directory);
        let database_path = env::var("NILAI_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("database.sqlite"));

        let jwt_secret =
            env::var("NILAI_JWT_SECRET").unwrap_or(defaults.authentication.jwt_secret);
        let token_ttl_hours = match env::var("NILAI_TOKEN_TTL_HOURS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation("Invalid token lifetime".to_string()))?,
            Err(_) => defaults.authentication.token_ttl_hours,
        };

        let superadmin_username = env::var("NILAI_SUPERADMIN_USERNAME")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.bootstrap.superadmin_username);
        let superadmin_password =
            env::var("NILAI_SUPERADMIN_PASSWORD").unwrap_or(defaults.bootstrap.superadmin_password);

        let backup = BackupConfig {
            enabled: env::var("NILAI_BACKUP_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backup.enabled),
            interval_hours: env::var("NILAI_BACKUP_INTERVAL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backup.interval_hours),
            backup_dir: env::var("NILAI_BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_directory.join("backups")),
            retain: env::var("NILAI_BACKUP_RETAIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backup.retain),
        };

        let level = env::var("RUST_LOG").unwrap_or(defaults.logging.level);
        let json = env::var("NILAI_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                cors_origins,
            },
            storage: StorageConfig {
                data_directory,
                database_path,
            },
            authentication: AuthConfig {
                jwt_secret,
                token_ttl_hours,
            },
            bootstrap: BootstrapConfig {
                superadmin_username,
                superadmin_password,
            },
            backup,
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if !(1..=MAX_HOURS).contains(&self.authentication.token_ttl_hours) {
            return Err(AppError::Validation(format!(
                "Token lifetime must be between 1 and {} hours",
                MAX_HOURS
            )));
        }

        if self.bootstrap.superadmin_username.is_empty() {
            return Err(AppError::Validation(
                "Superadmin username cannot be empty".to_string(),
            ));
        }

        if self.backup.enabled && !(1..=MAX_HOURS as u64).contains(&self.backup.interval_hours) {
            return Err(AppError::Validation(format!(
                "Backup interval must be between 1 and {} hours",
                MAX_HOURS
            )));
        }

        Ok(())
    }

    pub fn uses_development_secret(&self) -> bool {
        self.authentication.jwt_secret == DEVELOPMENT_JWT_SECRET
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.service.hostname, self.service.port)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
