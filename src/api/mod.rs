pub mod v2;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/v2", v2::router())
        .with_state(state)
}
