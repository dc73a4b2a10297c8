use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use super::{auth, handlers, state::AppState};

/// Build the dashboard router. /health is open; everything else requires
/// basic auth, with write endpoints additionally rate limited per client
/// IP (the limiter layer sits outside auth, matching the middleware order
/// of the admin panel this replaces).
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        // Read views
        .route("/api/accounts", get(handlers::list_accounts))
        .route("/api/accounts/:id", get(handlers::account_detail))
        .route("/api/leaderboard", get(handlers::top_leaderboard))
        .route("/api/leaderboard/monthly", get(handlers::monthly_leaderboard))
        // Engine actions
        .route("/api/actions/checkin", post(handlers::checkin))
        .route("/api/actions/message", post(handlers::message_activity))
        .route("/api/actions/wager", post(handlers::wager))
        // Administration
        .route("/api/admin/balance", post(handlers::set_balance))
        .route("/api/admin/reset-streak", post(handlers::reset_streak))
        .route("/api/admin/reset-checkin", post(handlers::reset_checkin))
        .route("/api/admin/wipe", post(handlers::begin_wipe))
        .route("/api/admin/wipe/confirm", post(handlers::confirm_wipe))
        .route("/api/admin/export", get(handlers::export))
        .route("/api/admin/import", post(handlers::import))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::limit_write_rate,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(authenticated)
        .with_state(state)
}
