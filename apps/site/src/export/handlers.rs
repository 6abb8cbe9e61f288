use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/export/:locale
/// Streams the résumé PDF back as an attachment.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Response, AppError> {
    let bundle = state.locales.get(&locale)?;
    let labels = bundle.export_labels();
    let notice = labels.export_error.clone();
    // A malformed bundle is an export failure to the visitor, not a bad request.
    let content = bundle
        .resume_content()
        .map_err(|e| AppError::export(e.into(), notice.clone()))?;

    let file = state
        .exporter
        .export(content, labels)
        .await
        .map_err(|e| AppError::export(e, notice))?;

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.bytes,
    )
        .into_response())
}

/// GET /api/v1/export/status
pub async fn handle_export_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "busy": state.exporter.is_busy() }))
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*` (RFC 6266), since header values must be visible ASCII.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_name_is_kept_in_both_forms() {
        assert_eq!(
            content_disposition("Ana_Ruiz_Resume.pdf"),
            "attachment; filename=\"Ana_Ruiz_Resume.pdf\"; filename*=UTF-8''Ana_Ruiz_Resume.pdf"
        );
    }

    #[test]
    fn test_accented_name_is_percent_encoded() {
        let header = content_disposition("Lucía_Resume.pdf");
        assert!(header.contains("filename=\"Luc_a_Resume.pdf\""));
        assert!(header.ends_with("filename*=UTF-8''Luc%C3%ADa_Resume.pdf"));
        assert!(header.is_ascii());
    }
}
