use serde::{Deserialize, Serialize};

/// Contact details shown in the header block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
}

/// One skill category with its localized heading and ordered labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillGroup {
    /// Bundle key of the category (e.g. `frontend`).
    pub key: String,
    /// Localized heading resolved from `sections.<key>`.
    pub label: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub period: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub project_period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl ExperienceEntry {
    /// Project name, treating blank strings as absent.
    pub fn project(&self) -> Option<&str> {
        non_blank(self.project.as_deref())
    }

    pub fn project_period(&self) -> Option<&str> {
        non_blank(self.project_period.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

/// Fully localized résumé, immutable for the duration of one export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeContent {
    pub name: String,
    pub title: String,
    pub profile: String,
    pub contact: Contact,
    pub skills: Vec<SkillGroup>,
    pub experience: Vec<ExperienceEntry>,
}

impl ResumeContent {
    /// Every skill label in category order; used for document keywords.
    pub fn all_skills(&self) -> impl Iterator<Item = &str> {
        self.skills
            .iter()
            .flat_map(|group| group.skills.iter().map(String::as_str))
    }
}

/// Labels for the contact block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactLabels {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
}

impl Default for ContactLabels {
    fn default() -> Self {
        Self {
            email: "Email:".to_string(),
            phone: "Phone:".to_string(),
            location: "Location:".to_string(),
            linkedin: "LinkedIn:".to_string(),
        }
    }
}

/// Localized UI strings consumed by the exporter and the export button.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportLabels {
    pub profile_section: String,
    pub skills_section: String,
    pub experience_section: String,
    pub contact: ContactLabels,
    pub export_pdf: String,
    pub exporting: String,
    pub export_error: String,
}

impl Default for ExportLabels {
    fn default() -> Self {
        Self {
            profile_section: "Professional Profile".to_string(),
            skills_section: "Skills".to_string(),
            experience_section: "Experience".to_string(),
            contact: ContactLabels::default(),
            export_pdf: "Export PDF".to_string(),
            exporting: "Exporting...".to_string(),
            export_error: "Error generating the PDF. Please try again.".to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
