//! Order API Module
//!
//! Creation, settlement and cancellation go through the checkout engine;
//! reads go straight to the repository.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        // Payment confirmation: the moment stock is definitively debited
        .route("/{id}/pay", post(handler::pay))
        // Privileged manual cancellation (HELD orders only)
        .route("/{id}/cancel", post(handler::cancel))
}
