use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::resume::{ExportLabels, ResumeContent};
use crate::state::AppState;

#[derive(Serialize)]
pub struct LocaleListResponse {
    pub locales: Vec<String>,
    pub default: String,
}

/// GET /api/v1/locales
pub async fn handle_list_locales(State(state): State<AppState>) -> Json<LocaleListResponse> {
    Json(LocaleListResponse {
        locales: state.locales.codes(),
        default: state.locales.default_locale().to_string(),
    })
}

/// GET /api/v1/content/:locale
pub async fn handle_get_content(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<ResumeContent>, AppError> {
    let content = state.locales.get(&locale)?.resume_content()?;
    Ok(Json(content))
}

/// GET /api/v1/labels/:locale
pub async fn handle_get_labels(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<ExportLabels>, AppError> {
    Ok(Json(state.locales.get(&locale)?.export_labels()))
}
