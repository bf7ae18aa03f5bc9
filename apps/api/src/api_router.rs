mod cors;

use axum::Router;
use axum::routing::{get, post};
use kasboek_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    Ok(build_routes()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}

fn build_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/risk/prioritize",
            post(handlers::risk::prioritize_clients_handler),
        )
        .route(
            "/api/action-log",
            get(handlers::action_log::list_action_log_handler)
                .delete(handlers::action_log::clear_action_log_handler),
        )
        .route(
            "/api/action-log/bulk-operations",
            post(handlers::action_log::log_bulk_operation_handler),
        )
        .route(
            "/api/action-log/{entry_id}",
            get(handlers::action_log::get_action_log_entry_handler),
        )
        .route(
            "/api/selection",
            get(handlers::selection::get_selection_handler)
                .put(handlers::selection::replace_selection_handler)
                .delete(handlers::selection::clear_selection_handler),
        )
        .route(
            "/api/selection/toggle",
            post(handlers::selection::toggle_selection_handler),
        )
        .route(
            "/api/selection/add",
            post(handlers::selection::add_to_selection_handler),
        )
        .route(
            "/api/selection/remove",
            post(handlers::selection::remove_from_selection_handler),
        )
        .route(
            "/api/selection/only-failed",
            post(handlers::selection::select_only_failed_handler),
        )
        .route(
            "/api/onboarding/{user_id}",
            get(handlers::onboarding::get_onboarding_handler)
                .delete(handlers::onboarding::reset_onboarding_handler),
        )
        .route(
            "/api/onboarding/{user_id}/advance",
            post(handlers::onboarding::advance_onboarding_handler),
        )
        .route(
            "/api/onboarding/{user_id}/complete",
            post(handlers::onboarding::complete_onboarding_handler),
        )
        .route(
            "/api/onboarding/{user_id}/dismiss",
            post(handlers::onboarding::dismiss_onboarding_handler),
        )
}
