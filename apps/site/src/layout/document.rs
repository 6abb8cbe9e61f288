//! Display list produced by the composer and consumed by the PDF writer.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFace;
use crate::layout::geometry::{Color, PageGeometry};

/// What a draw operation represents in the résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Photo,
    Name,
    Title,
    HeaderRule,
    ContactLabel,
    ContactValue,
    SectionTitle,
    SectionRule,
    ProfileLine,
    SkillCategory,
    SkillLine,
    Company,
    Period,
    Position,
    Project,
    ProjectPeriod,
    DescriptionLine,
    BulletMarker,
    BulletLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub face: FontFace,
    pub size_pt: f32,
    pub color: Color,
    /// Extra space added to each inter-word gap, for justified lines.
    pub word_spacing_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width_mm: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f32)>,
}

/// Placement of the profile photo, clipped to the inscribed circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Text(TextRun),
    Line(Rule),
    Circle(Disc),
    Image(ImagePlacement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOp {
    pub kind: ElementKind,
    /// Index of the skill category or experience entry the op belongs to.
    pub group: Option<usize>,
    pub shape: Shape,
}

// Extents and lookups used by the layout tests to check placement.
#[cfg(test)]
impl DrawOp {
    /// Lowest y reached by this op.
    pub fn bottom(&self) -> f32 {
        match &self.shape {
            // Helvetica descends 0.21 em below the baseline.
            Shape::Text(run) => {
                run.baseline + run.size_pt * crate::layout::font_metrics::PT_TO_MM * 0.21
            }
            Shape::Line(rule) => rule.y1.max(rule.y2) + rule.width_mm / 2.0,
            Shape::Circle(disc) => {
                let stroke = disc.stroke.map(|(_, w)| w / 2.0).unwrap_or(0.0);
                disc.cy + disc.radius + stroke
            }
            Shape::Image(img) => img.y + img.size,
        }
    }

    /// Topmost y reached by this op (text uses its baseline minus cap height).
    pub fn top(&self) -> f32 {
        match &self.shape {
            Shape::Text(run) => {
                run.baseline - run.size_pt * crate::layout::font_metrics::PT_TO_MM * 0.72
            }
            Shape::Line(rule) => rule.y1.min(rule.y2) - rule.width_mm / 2.0,
            Shape::Circle(disc) => {
                let stroke = disc.stroke.map(|(_, w)| w / 2.0).unwrap_or(0.0);
                disc.cy - disc.radius - stroke
            }
            Shape::Image(img) => img.y,
        }
    }

    pub fn text(&self) -> Option<&TextRun> {
        match &self.shape {
            Shape::Text(run) => Some(run),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

/// Document information dictionary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
}

/// The complete paginated layout of one résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaidOutDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
    pub metadata: DocumentMetadata,
}

#[cfg(test)]
impl LaidOutDocument {
    /// All ops in drawing order, with their page index.
    pub fn ops(&self) -> impl Iterator<Item = (usize, &DrawOp)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, page)| page.ops.iter().map(move |op| (i, op)))
    }

    pub fn ops_of(&self, kind: ElementKind) -> impl Iterator<Item = (usize, &DrawOp)> {
        self.ops().filter(move |(_, op)| op.kind == kind)
    }
}
