use std::sync::Arc;

use crate::export::Exporter;
use crate::i18n::LocaleRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Embedded translation bundles; read-only after startup.
    pub locales: Arc<LocaleRegistry>,
    /// Holds the busy flag, so it must be shared rather than cloned per request.
    pub exporter: Arc<Exporter>,
}
