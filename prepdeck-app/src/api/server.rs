use axum::{
    routing::{get, post},
    Router,
};
use prepdeck_core::{Flashcards, RecordStore};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{due_cards, list_decks, list_notes, post_review, AppState};

pub fn router(store: Arc<dyn RecordStore>) -> Router {
    let state = Arc::new(AppState {
        flashcards: Flashcards::new(store.clone()),
        store,
    });

    Router::new()
        .route("/decks", get(list_decks))
        .route("/due", get(due_cards))
        .route("/review", post(post_review))
        .route("/notes", get(list_notes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(store: Arc<dyn RecordStore>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(store);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
