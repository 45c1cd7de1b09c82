use axum::{extract::State, routing::get, Json, Router};
use info_screen_core::TriageView;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::bookings::BookingBoard;

#[derive(Clone)]
pub struct AppState {
    tickets: watch::Receiver<TriageView>,
    bookings: watch::Receiver<BookingBoard>,
    assets: watch::Receiver<u64>,
}

impl AppState {
    pub fn new(
        tickets: watch::Receiver<TriageView>,
        bookings: watch::Receiver<BookingBoard>,
        assets: watch::Receiver<u64>,
    ) -> Self {
        Self {
            tickets,
            bookings,
            assets,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsResponse {
    pub generation: u64,
}

/// Read-only display feed. Every handler answers from the latest published
/// value and never waits on the backend.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/tickets", get(tickets))
        .route("/v1/bookings", get(bookings))
        .route("/v1/assets", get(assets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn tickets(State(st): State<AppState>) -> Json<TriageView> {
    Json(st.tickets.borrow().clone())
}

async fn bookings(State(st): State<AppState>) -> Json<BookingBoard> {
    Json(st.bookings.borrow().clone())
}

async fn assets(State(st): State<AppState>) -> Json<AssetsResponse> {
    Json(AssetsResponse {
        generation: *st.assets.borrow(),
    })
}
