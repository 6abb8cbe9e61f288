// Document layout: glyph metrics, page geometry, the running cursor, and the
// résumé composer that turns content into a paginated display list.
// Layout is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod composer;
pub mod cursor;
pub mod document;
pub mod font_metrics;
pub mod geometry;

// Re-export the public API consumed by the exporter.
pub use composer::{compose_resume, ComposeOptions, LayoutError};
pub use geometry::PageGeometry;
