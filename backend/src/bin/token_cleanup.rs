//! Removes expired access and refresh tokens. Meant to run from cron.

use hrm_backend::{config::Config, db::connection::create_pool, repositories::auth as auth_repo};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_cleanup=info,hrm_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url, 1).await?;

    let access = auth_repo::cleanup_expired_access_tokens(&pool).await?;
    let refresh = auth_repo::cleanup_expired_refresh_tokens(&pool).await?;
    tracing::info!(access, refresh, "Deleted expired tokens");

    for table in ["active_access_tokens", "refresh_tokens"] {
        sqlx::query(&format!("VACUUM (ANALYZE) {}", table))
            .execute(&pool)
            .await?;
    }

    Ok(())
}
