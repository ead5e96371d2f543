mod app;
mod auth;
mod config;
mod db;
mod error;
mod response;
mod state;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "simplebank=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (host, port, run_migrations) = (config.host.clone(), config.port, config.run_migrations);

    let (app_state, pool) = AppState::init(config).await?;
    if run_migrations {
        db::migrate(&pool).await;
    }
    tracing::info!(
        password_reset = ?app_state.config.auth.password_reset,
        "account service ready"
    );

    let app = app::build_app(app_state);
    let served = app::serve(app, &host, port).await;

    db::close(pool).await;
    served
}
