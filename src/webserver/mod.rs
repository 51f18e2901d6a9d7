use axum::{
    routing::{get, post},
    Router,
};

use crate::{appstate::AppState, database::Database};

mod error;
mod handlers;
mod page;
#[cfg(test)]
mod tests;

pub use error::{WebError, WebResult};

pub fn create_router<D: Database + Send + 'static>(app_state: AppState<D>) -> Router {
    Router::new()
        .route("/", get(handlers::index::<D>))
        .route("/register", post(handlers::register::<D>))
        .route("/login", post(handlers::login::<D>))
        .route("/logout", post(handlers::logout::<D>))
        .route("/submit_score", post(handlers::submit_score::<D>))
        .route("/health", get(handlers::health))
        .with_state(app_state)
}

pub async fn serve<D: Database + Send + 'static>(
    app_state: AppState<D>,
    bind_address: &str,
) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("cannot listen for ctrl-c {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Shutting down");
    };

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
