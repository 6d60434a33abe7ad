use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/expenses", post(handlers::add_expense_form))
        .route("/expenses/:id/delete", post(handlers::delete_expense_form))
        .route("/settings", post(handlers::save_settings_form))
        .route("/categories", post(handlers::add_category_form))
        .route("/categories/delete", post(handlers::remove_category_form))
        .route("/calendar/prev", post(handlers::calendar_prev))
        .route("/calendar/next", post(handlers::calendar_next))
        .route("/calendar/today", post(handlers::calendar_today))
        .route("/day/:date", post(handlers::open_day))
        .route("/modal/filter", post(handlers::filter_day))
        .route("/modal/close", post(handlers::close_day))
        .route("/export", get(handlers::export_download))
        .route("/import", post(handlers::import_form))
        .route("/api/expenses", get(handlers::list_expenses).post(handlers::create_expense))
        .route(
            "/api/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/day/:date", get(handlers::get_day))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/categories", get(handlers::list_categories).post(handlers::create_category))
        .route("/api/categories/:name", axum::routing::delete(handlers::delete_category))
        .route("/api/settings", get(handlers::get_settings).put(handlers::put_settings))
        .route("/api/settings/draft", post(handlers::draft_settings))
        .route("/api/export", get(handlers::export_download))
        .route("/api/import", post(handlers::import_json))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
