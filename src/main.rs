use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use writing_progress::refresh::{refresh_progress, ChangeEvent};
use writing_progress::ticker::Ticker;
use writing_progress::{load_data, router, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    let state = AppState::new(config.data_path.clone(), data, config.carousel_interval);
    refresh_progress(&state, ChangeEvent::InitialLoad).await;

    let mut refresher = Ticker::new("progress", config.refresh_interval);
    let ticking = state.clone();
    refresher.start(move || {
        let state = ticking.clone();
        async move {
            refresh_progress(&state, ChangeEvent::Tick).await;
        }
    });
    state.resume_carousel().await;

    let app = router(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.stop();
    state.pause_carousel().await;
    state.progress.lock().await.teardown();
    info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
