//! Locale bundles: embedded JSON translation files, resolved with dotted keys.
//!
//! Lookups follow i18next conventions: a missing string key resolves to the key
//! itself, and `skills` / `experience` are read in their object/array form.

pub mod handlers;

use std::collections::BTreeMap;

use rust_embed::RustEmbed;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::resume::{
    Contact, ContactLabels, ExperienceEntry, ExportLabels, ResumeContent, SkillGroup,
};

#[derive(RustEmbed)]
#[folder = "locales/"]
struct LocaleAssets;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Unknown locale '{0}'")]
    UnknownLocale(String),

    #[error("Locale bundle '{locale}' is not valid JSON: {source}")]
    InvalidBundle {
        locale: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Key '{key}' has the wrong shape: expected {expected}")]
    WrongShape { key: String, expected: &'static str },

    #[error("Experience entry {index} is malformed: {source}")]
    InvalidExperience {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// LocaleBundle
// ────────────────────────────────────────────────────────────────────────────

/// A single locale's translation tree.
#[derive(Debug, Clone)]
pub struct LocaleBundle {
    code: String,
    root: Value,
}

impl LocaleBundle {
    pub fn from_json(code: &str, raw: &str) -> Result<Self, ContentError> {
        let root = serde_json::from_str(raw).map_err(|source| ContentError::InvalidBundle {
            locale: code.to_string(),
            source,
        })?;
        Ok(Self {
            code: code.to_string(),
            root,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Raw value at a dotted key path, if present.
    pub fn t_value(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// String at `key`, or the key itself when missing or not a string.
    pub fn t(&self, key: &str) -> String {
        self.t_opt(key).unwrap_or_else(|| key.to_string())
    }

    /// String at `key`, or `None` when missing.
    pub fn t_opt(&self, key: &str) -> Option<String> {
        self.t_value(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn t_or(&self, key: &str, fallback: &str) -> String {
        self.t_opt(key).unwrap_or_else(|| fallback.to_string())
    }

    /// Builds the résumé record from this bundle.
    pub fn resume_content(&self) -> Result<ResumeContent, ContentError> {
        Ok(ResumeContent {
            name: self.t("name"),
            title: self.t("title"),
            profile: self.t("profile"),
            contact: Contact {
                email: self.t("contact.email"),
                phone: self.t("contact.phone"),
                location: self.t("contact.location"),
                linkedin: self.t("contact.linkedin"),
            },
            skills: self.skill_groups()?,
            experience: self.experience()?,
        })
    }

    /// Builds the exporter / button labels from this bundle.
    pub fn export_labels(&self) -> ExportLabels {
        let defaults = ExportLabels::default();
        let contact_defaults = ContactLabels::default();
        ExportLabels {
            profile_section: self.t_or("sections.profile", &defaults.profile_section),
            skills_section: self.t_or("sections.skills", &defaults.skills_section),
            experience_section: self.t_or("sections.experience", &defaults.experience_section),
            contact: ContactLabels {
                email: self.t_or("contact.labels.email", &contact_defaults.email),
                phone: self.t_or("contact.labels.phone", &contact_defaults.phone),
                location: self.t_or("contact.labels.location", &contact_defaults.location),
                linkedin: self.t_or("contact.labels.linkedin", &contact_defaults.linkedin),
            },
            export_pdf: self.t_or("exportPDF", &defaults.export_pdf),
            exporting: self.t_or("exporting", &defaults.exporting),
            export_error: self.t_or("exportError", &defaults.export_error),
        }
    }

    fn skill_groups(&self) -> Result<Vec<SkillGroup>, ContentError> {
        let Some(value) = self.t_value("skills") else {
            return Ok(Vec::new());
        };
        let map = value.as_object().ok_or_else(|| ContentError::WrongShape {
            key: "skills".to_string(),
            expected: "object",
        })?;

        // Non-array categories render an empty list, as the on-screen grid does.
        Ok(map
            .iter()
            .map(|(key, items)| SkillGroup {
                key: key.clone(),
                label: self.t(&format!("sections.{key}")),
                skills: items
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect())
    }

    fn experience(&self) -> Result<Vec<ExperienceEntry>, ContentError> {
        let Some(value) = self.t_value("experience") else {
            return Ok(Vec::new());
        };
        let items = value.as_array().ok_or_else(|| ContentError::WrongShape {
            key: "experience".to_string(),
            expected: "array",
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ExperienceEntry::deserialize(item)
                    .map_err(|source| ContentError::InvalidExperience { index, source })
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LocaleRegistry
// ────────────────────────────────────────────────────────────────────────────

/// All bundles known to the site, keyed by locale code.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    bundles: BTreeMap<String, LocaleBundle>,
    default_locale: String,
}

impl LocaleRegistry {
    /// Loads every embedded `locales/*.json` file.
    pub fn load_embedded(default_locale: &str) -> Result<Self, ContentError> {
        let mut bundles = BTreeMap::new();
        for file in LocaleAssets::iter() {
            let filename = file.as_ref();
            let Some(code) = filename.strip_suffix(".json") else {
                continue;
            };
            if let Some(asset) = LocaleAssets::get(filename) {
                let raw = String::from_utf8_lossy(asset.data.as_ref());
                let bundle = LocaleBundle::from_json(code, &raw)?;
                debug!("Loaded locale bundle '{code}'");
                bundles.insert(code.to_string(), bundle);
            }
        }
        let registry = Self::from_bundles(bundles.into_values(), default_locale)?;
        info!(
            "Locales available: {:?} (default: {})",
            registry.codes(),
            registry.default_locale
        );
        Ok(registry)
    }

    /// Builds a registry from explicit bundles. The default locale must be present.
    pub fn from_bundles(
        bundles: impl IntoIterator<Item = LocaleBundle>,
        default_locale: &str,
    ) -> Result<Self, ContentError> {
        let bundles: BTreeMap<String, LocaleBundle> = bundles
            .into_iter()
            .map(|b| (b.code().to_string(), b))
            .collect();
        if !bundles.contains_key(default_locale) {
            return Err(ContentError::UnknownLocale(default_locale.to_string()));
        }
        Ok(Self {
            bundles,
            default_locale: default_locale.to_string(),
        })
    }

    pub fn codes(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn get(&self, code: &str) -> Result<&LocaleBundle, ContentError> {
        self.bundles
            .get(code)
            .ok_or_else(|| ContentError::UnknownLocale(code.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
