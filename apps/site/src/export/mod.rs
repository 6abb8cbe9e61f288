//! Résumé export: the single-flight PDF pipeline behind the export button.
//!
//! One export runs at a time. While it runs the busy flag is set and any
//! further request is rejected rather than queued. The flag is held by the
//! blocking layout task itself, so a caller that stops waiting does not free
//! it before the work is done. The profile photo is loaded first; a photo
//! that cannot be read never fails the export. Layout and serialization are
//! CPU-bound and run inside `spawn_blocking`.

pub mod handlers;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::i18n::ContentError;
use crate::layout::{compose_resume, ComposeOptions, LayoutError, PageGeometry};
use crate::models::resume::{ExportLabels, ResumeContent};
use crate::pdf::{write_pdf, PdfError, ProfileImage};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("An export is already in progress")]
    Busy,

    #[error("Résumé content is invalid: {0}")]
    Content(#[from] ContentError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("PDF serialization failed: {0}")]
    Serialize(#[from] PdfError),

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ────────────────────────────────────────────────────────────────────────────
// Busy flag
// ────────────────────────────────────────────────────────────────────────────

/// Shared "export in progress" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Sets the flag if it was clear. The returned guard clears it on drop,
    /// so the flag resets on success, on error, and on panic alike.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile photo source
// ────────────────────────────────────────────────────────────────────────────

/// Where the exporter gets the profile photo from.
/// Implementations swallow their own failures: `None` means "draw the placeholder".
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self) -> Option<ProfileImage>;
}

/// Reads and decodes a JPEG or PNG from disk on every export.
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn load(&self) -> Option<ProfileImage> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Profile image {} unavailable: {e}", self.path.display());
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || ProfileImage::decode(&raw)).await {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                warn!("Profile image {} could not be decoded: {e}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Profile image decode task failed: {e}");
                None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Exporter
// ────────────────────────────────────────────────────────────────────────────

/// A finished export, ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Download name: the person's name with whitespace runs joined by `_`,
/// followed by `_Resume.pdf`. Surrounding whitespace is dropped.
pub fn export_file_name(name: &str) -> String {
    let stem = name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_Resume.pdf")
}

pub struct Exporter {
    busy: BusyFlag,
    images: Arc<dyn ImageSource>,
    geometry: PageGeometry,
    creator: String,
}

impl Exporter {
    pub fn new(images: Arc<dyn ImageSource>, geometry: PageGeometry) -> Self {
        Self {
            busy: BusyFlag::default(),
            images,
            geometry,
            creator: ComposeOptions::default().creator,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Runs one export. Returns `ExportError::Busy` immediately if another
    /// export holds the flag.
    pub async fn export(
        &self,
        content: ResumeContent,
        labels: ExportLabels,
    ) -> Result<ExportedFile, ExportError> {
        let guard = self.busy.try_acquire().ok_or(ExportError::Busy)?;

        let photo = self.images.load().await;
        let options = ComposeOptions {
            geometry: self.geometry,
            has_photo: photo.is_some(),
            creator: self.creator.clone(),
        };
        let file_name = export_file_name(&content.name);

        let (bytes, pages) = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let doc = compose_resume(&content, &labels, &options)?;
            let bytes = write_pdf(&doc, photo.as_ref(), Utc::now())?;
            Ok::<_, ExportError>((bytes, doc.pages.len()))
        })
        .await??;

        info!(
            "Exported {file_name}: {pages} page(s), {} bytes",
            bytes.len()
        );

        Ok(ExportedFile {
            file_name,
            bytes: Bytes::from(bytes),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Contact, ExperienceEntry, SkillGroup};
    use tokio::sync::Notify;

    struct NoImage;

    #[async_trait]
    impl ImageSource for NoImage {
        async fn load(&self) -> Option<ProfileImage> {
            None
        }
    }

    /// Blocks inside `load` until the test opens the gate.
    struct GatedImage {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ImageSource for GatedImage {
        async fn load(&self) -> Option<ProfileImage> {
            self.gate.notified().await;
            None
        }
    }

    fn make_content(name: &str) -> ResumeContent {
        ResumeContent {
            name: name.to_string(),
            title: "Senior Frontend Developer".to_string(),
            profile: "Builds accessible interfaces and fast web platforms.".to_string(),
            contact: Contact {
                email: "lucia@example.com".to_string(),
                phone: "+34 600 000 000".to_string(),
                location: "Madrid, España".to_string(),
                linkedin: "linkedin.com/in/lucia".to_string(),
            },
            skills: vec![SkillGroup {
                key: "frontend".to_string(),
                label: "Frontend".to_string(),
                skills: vec!["React".to_string(), "TypeScript".to_string()],
            }],
            experience: vec![ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                period: "2020 - 2024".to_string(),
                project: None,
                project_period: None,
                description: Some("Design system lead.".to_string()),
                highlights: vec!["Shipped v2".to_string()],
            }],
        }
    }

    fn make_exporter(images: Arc<dyn ImageSource>) -> Arc<Exporter> {
        Arc::new(Exporter::new(images, PageGeometry::a4()))
    }

    #[test]
    fn test_file_name_joins_whitespace_runs() {
        assert_eq!(
            export_file_name("Lucía  Fernández\tOrtega"),
            "Lucía_Fernández_Ortega_Resume.pdf"
        );
    }

    #[test]
    fn test_file_name_drops_surrounding_whitespace() {
        assert_eq!(export_file_name("  Ana Ruiz "), "Ana_Ruiz_Resume.pdf");
    }

    #[test]
    fn test_busy_flag_is_exclusive_and_resets_on_drop() {
        let flag = BusyFlag::default();
        let guard = flag.try_acquire().expect("first acquire succeeds");
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn test_busy_flag_resets_after_panic() {
        let flag = BusyFlag::default();
        let cloned = flag.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.try_acquire().unwrap();
            panic!("layout blew up");
        });
        assert!(result.is_err());
        assert!(!flag.is_busy());
    }

    #[tokio::test]
    async fn test_export_produces_named_pdf() {
        let exporter = make_exporter(Arc::new(NoImage));
        let file = exporter
            .export(make_content("Lucía Fernández"), ExportLabels::default())
            .await
            .unwrap();
        assert_eq!(file.file_name, "Lucía_Fernández_Resume.pdf");
        assert!(file.bytes.starts_with(b"%PDF-"));
        let pdf = lopdf::Document::load_mem(&file.bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn test_second_export_while_busy_is_rejected() {
        let gate = Arc::new(Notify::new());
        let exporter = make_exporter(Arc::new(GatedImage { gate: gate.clone() }));

        let running = {
            let exporter = exporter.clone();
            tokio::spawn(async move {
                exporter
                    .export(make_content("Ana Ruiz"), ExportLabels::default())
                    .await
            })
        };

        while !exporter.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = exporter
            .export(make_content("Ana Ruiz"), ExportLabels::default())
            .await;
        assert!(matches!(second, Err(ExportError::Busy)));
        assert!(exporter.is_busy());

        gate.notify_one();
        let first = running.await.unwrap().unwrap();
        assert_eq!(first.file_name, "Ana_Ruiz_Resume.pdf");
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn test_abandoned_export_stays_busy_until_layout_finishes() {
        let exporter = make_exporter(Arc::new(NoImage));
        let mut content = make_content("Ana Ruiz");
        content.profile = (0..100_000)
            .map(|i| format!("palabra{i}"))
            .collect::<Vec<_>>()
            .join(" ");

        let running = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export(content, ExportLabels::default()).await })
        };
        // The image source resolves at once, so by the time the flag is set
        // the same poll has already handed layout to the blocking pool.
        while !exporter.is_busy() {
            tokio::task::yield_now().await;
        }

        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());

        assert!(exporter.is_busy());
        let second = exporter
            .export(make_content("Ana Ruiz"), ExportLabels::default())
            .await;
        assert!(matches!(second, Err(ExportError::Busy)));

        tokio::time::timeout(std::time::Duration::from_secs(120), async {
            while exporter.is_busy() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("layout task released the flag");
        assert!(exporter
            .export(make_content("Ana Ruiz"), ExportLabels::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_failed_export_clears_busy_flag() {
        let exporter = make_exporter(Arc::new(NoImage));
        let result = exporter
            .export(make_content("   "), ExportLabels::default())
            .await;
        assert!(matches!(
            result,
            Err(ExportError::Layout(LayoutError::MissingField("name")))
        ));
        assert!(!exporter.is_busy());

        // A failure does not block the next attempt.
        assert!(exporter
            .export(make_content("Ana Ruiz"), ExportLabels::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_photo_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileImageSource::new(dir.path().join("missing.jpeg"));
        assert!(source.load().await.is_none());

        let exporter = make_exporter(Arc::new(source));
        let file = exporter
            .export(make_content("Ana Ruiz"), ExportLabels::default())
            .await
            .unwrap();
        assert!(file.bytes.len() > 100);
    }

    #[tokio::test]
    async fn test_corrupt_photo_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.jpeg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(FileImageSource::new(&path).load().await.is_none());
    }

    #[tokio::test]
    async fn test_png_photo_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.png");
        image::RgbImage::from_pixel(40, 30, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();
        let photo = FileImageSource::new(&path).load().await.unwrap();
        assert_eq!(photo.width, photo.height);
    }
}
