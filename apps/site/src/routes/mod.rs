pub mod health;

use axum::{routing::get, Router};

use crate::export::handlers as export;
use crate::i18n::handlers as i18n;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Localized content for the display page and the locale switcher
        .route("/api/v1/locales", get(i18n::handle_list_locales))
        .route("/api/v1/content/:locale", get(i18n::handle_get_content))
        .route("/api/v1/labels/:locale", get(i18n::handle_get_labels))
        // PDF export
        .route("/api/v1/export/status", get(export::handle_export_status))
        .route("/api/v1/export/:locale", get(export::handle_export))
        .with_state(state)
}
