/// Nilai Dashboard server binary
use nilai_dashboard::{config::ServerConfig, jobs, server, AppContext, AppResult};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration first so the log format can follow it
    let config = ServerConfig::from_env()?;

    init_logging(&config.logging.level, config.logging.json);

    print_banner();

    if config.uses_development_secret() {
        tracing::warn!("NILAI_JWT_SECRET is not set; using the built-in development secret");
    }
    if config.bootstrap.superadmin_password == ServerConfig::default().bootstrap.superadmin_password
    {
        tracing::warn!(
            "Superadmin '{}' uses the default password; set NILAI_SUPERADMIN_PASSWORD",
            config.bootstrap.superadmin_username
        );
    }

    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level)
        .unwrap_or_else(|_| EnvFilter::new("nilai_dashboard=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
    _   ___ __      _
   / | / (_) /___ _(_)
  /  |/ / / / __ `/ /
 / /|  / / / /_/ / /
/_/ |_/_/_/\__,_/_/   dashboard

        Student grade admin API v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
