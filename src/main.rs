use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deploy_console::app_state::build_app_state;
use deploy_console::config::AppConfig;
use deploy_console::routes::app_router;
use deploy_console::scheduler::tasks::draft_pruner::task::spawn_draft_pruner;

const DEFAULT_LOG_FILTER: &str = "deploy_console=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _guard = init_tracing(config.log_dir.as_deref());

    info!(
        endpoint = %config.yatai_endpoint,
        organization = %config.yatai_organization,
        "starting deploy console"
    );

    let bind_addr = config.bind_addr.clone();
    let state = build_app_state(config)?;
    spawn_draft_pruner(state.clone());

    let app = app_router().with_state(state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("deploy console stopped");
    Ok(())
}

/// Stdout always; a daily rolling file as well when `log_dir` is set.
/// The returned guard must live as long as the process.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "deploy-console.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
