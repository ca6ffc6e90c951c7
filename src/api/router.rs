//! HTTP surface.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! CORS is wide open: the webhook sender and the frontend both live on
//! other origins.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

pub fn build_router(ctx: ApiContext) -> Router {
    Router::new()
        .route(
            "/webhook/whatsapp",
            post(endpoints::webhook::receive).options(endpoints::webhook::preflight),
        )
        .route("/cutlist/from-source", post(endpoints::cutlists::create_from_source))
        .route(
            "/cutlist/:id",
            get(endpoints::cutlists::get_html).put(endpoints::cutlists::update),
        )
        .route("/cutlist/:id/data", get(endpoints::cutlists::get_data))
        .route("/cutlists", get(endpoints::cutlists::list))
        .route("/whatsapp/send-cutlist", post(endpoints::webhook::send_cutlist))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}
