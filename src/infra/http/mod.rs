pub mod error;
pub mod handlers;
pub mod middleware;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::auth::TokenValidator;
use crate::application::tasks::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskService>,
    pub auth: Arc<dyn TokenValidator>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", get(handlers::list_tasks))
        .route(
            "/tasks/{id}",
            post(handlers::create_task)
                .get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .with_state(state.clone())
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
