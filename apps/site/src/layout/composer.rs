//! Résumé composer: lays a `ResumeContent` out into a paginated display list.
//!
//! # Flow
//! header → contact block → profile → skills (two columns) → experience.
//!
//! Every variable-height block is measured first with the same `wrap_lines`
//! call that later draws it, then the page break is decided, then it is drawn.
//! The cursor therefore advances by rendered line count × line height, and no
//! op is ever placed below the bottom margin. Blocks taller than a whole page
//! flow line by line.

use thiserror::Error;
use tracing::debug;

use crate::layout::cursor::LayoutCursor;
use crate::layout::document::{
    Disc, DocumentMetadata, DrawOp, ElementKind, ImagePlacement, LaidOutDocument, Page, Rule,
    Shape, TextRun,
};
use crate::layout::font_metrics::{get_metrics, FontFace, PT_TO_MM};
use crate::layout::geometry::{palette, Color, PageGeometry};
use crate::models::resume::{ExperienceEntry, ExportLabels, ResumeContent};

// Header
const PHOTO_SIZE: f32 = 30.0;
const PHOTO_RING_WIDTH: f32 = 0.8;
const PHOTO_TEXT_GAP: f32 = 6.0;
const NAME_PT: f32 = 22.0;
const NAME_MIN_PT: f32 = 14.0;
const NAME_LINE: f32 = 10.0;
const TITLE_PT: f32 = 14.0;
const TITLE_LINE: f32 = 7.0;
const INITIALS_PT: f32 = 20.0;
const HEADER_RULE_OFFSET: f32 = 34.0;
const HEADER_RULE_WIDTH: f32 = 0.8;
const HEADER_ADVANCE: f32 = 40.0;

// Contact
const CONTACT_PT: f32 = 9.5;
const CONTACT_LINK_PT: f32 = 8.0;
const CONTACT_MIN_PT: f32 = 6.0;
const CONTACT_LINE: f32 = 6.0;
const CONTACT_LABEL_GAP: f32 = 1.5;

// Sections
const SECTION_TITLE_PT: f32 = 13.0;
const SECTION_TITLE_LINE: f32 = 7.0;
const SECTION_RULE_WIDTH: f32 = 0.4;
const SECTION_TITLE_HEIGHT: f32 = 10.0;
const SECTION_GAP: f32 = 6.0;

// Profile
const PROFILE_PT: f32 = 10.0;
pub(crate) const PROFILE_LINE: f32 = 5.3;

// Skills
const COLUMN_GAP: f32 = 8.0;
const SKILL_CATEGORY_PT: f32 = 10.5;
const SKILL_CATEGORY_LINE: f32 = 5.5;
const SKILL_PT: f32 = 9.0;
const SKILL_LINE: f32 = 4.6;
const SKILL_ROW_GAP: f32 = 4.0;

// Experience
const COMPANY_PT: f32 = 12.0;
const COMPANY_LINE: f32 = 6.0;
const PERIOD_PT: f32 = 9.0;
const POSITION_PT: f32 = 10.5;
const POSITION_LINE: f32 = 5.5;
const PROJECT_PT: f32 = 9.5;
const PROJECT_PERIOD_PT: f32 = 8.0;
const PROJECT_LINE: f32 = 5.0;
const BODY_PT: f32 = 9.5;
const BODY_LINE: f32 = 4.8;
const DESCRIPTION_GAP: f32 = 1.5;
const BULLET_MARKER_OFFSET: f32 = 1.5;
const BULLET_INDENT: f32 = 5.0;
const BULLET_GAP: f32 = 1.0;
const ENTRY_GAP: f32 = 7.0;
const RIGHT_COLUMN_GAP: f32 = 4.0;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Résumé field '{0}' is empty")]
    MissingField(&'static str),
}

/// Inputs to a compose pass that are not résumé content.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub geometry: PageGeometry,
    /// Whether a profile photo will be embedded; otherwise an initials disc is drawn.
    pub has_photo: bool,
    /// Written to the document's Creator field.
    pub creator: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::a4(),
            has_photo: false,
            creator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Lays out one résumé. Deterministic: the same input yields the same display list.
pub fn compose_resume(
    content: &ResumeContent,
    labels: &ExportLabels,
    options: &ComposeOptions,
) -> Result<LaidOutDocument, LayoutError> {
    if content.name.trim().is_empty() {
        return Err(LayoutError::MissingField("name"));
    }

    let mut composer = Composer::new(options.geometry);
    composer.header(content, options.has_photo);
    composer.contact(content, labels);
    if !content.profile.trim().is_empty() {
        composer.profile(&labels.profile_section, &content.profile);
    }
    if !content.skills.is_empty() {
        composer.skills(&labels.skills_section, content);
    }
    if !content.experience.is_empty() {
        composer.experience(&labels.experience_section, &content.experience);
    }

    let metadata = DocumentMetadata {
        title: format!("{} - {}", content.name, content.title),
        author: content.name.clone(),
        subject: labels.profile_section.clone(),
        keywords: content.all_skills().collect::<Vec<_>>().join(", "),
        creator: options.creator.clone(),
    };

    debug!(
        "Composed résumé for '{}' into {} page(s)",
        content.name,
        composer.pages.len()
    );

    Ok(LaidOutDocument {
        geometry: options.geometry,
        pages: composer.pages,
        metadata,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Measured blocks
// ────────────────────────────────────────────────────────────────────────────

struct SkillBlock {
    group: usize,
    /// Category heading, wrapped to the column width.
    heading: Vec<String>,
    lines: Vec<String>,
}

impl SkillBlock {
    fn height(&self) -> f32 {
        self.heading.len() as f32 * SKILL_CATEGORY_LINE + self.lines.len() as f32 * SKILL_LINE
    }
}

struct EntryBlock<'a> {
    entry: &'a ExperienceEntry,
    description: Vec<String>,
    bullets: Vec<Vec<String>>,
}

impl EntryBlock<'_> {
    fn has_project_line(&self) -> bool {
        self.entry.project().is_some() || self.entry.project_period().is_some()
    }

    fn header_height(&self) -> f32 {
        let project = if self.has_project_line() {
            PROJECT_LINE
        } else {
            0.0
        };
        COMPANY_LINE + POSITION_LINE + project
    }

    /// Header plus the first description line (or the whole first bullet),
    /// which must share a page.
    fn lead_height(&self) -> f32 {
        let first_body = if !self.description.is_empty() {
            BODY_LINE
        } else {
            self.bullets
                .first()
                .map(|lines| lines.len() as f32 * BODY_LINE)
                .unwrap_or(0.0)
        };
        self.header_height() + first_body
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composer
// ────────────────────────────────────────────────────────────────────────────

struct Composer {
    cursor: LayoutCursor,
    pages: Vec<Page>,
}

impl Composer {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            cursor: LayoutCursor::new(geometry),
            pages: vec![Page::default()],
        }
    }

    fn geometry(&self) -> PageGeometry {
        *self.cursor.geometry()
    }

    fn push(&mut self, kind: ElementKind, group: Option<usize>, shape: Shape) {
        let page = self.cursor.page();
        while self.pages.len() <= page {
            self.pages.push(Page::default());
        }
        self.pages[page].ops.push(DrawOp { kind, group, shape });
    }

    /// Places one line of text inside a line box whose top edge is `top`.
    #[allow(clippy::too_many_arguments)]
    fn text_at(
        &mut self,
        kind: ElementKind,
        group: Option<usize>,
        x: f32,
        top: f32,
        line_height: f32,
        text: &str,
        face: FontFace,
        size_pt: f32,
        color: Color,
        word_spacing_mm: f32,
    ) {
        self.push(
            kind,
            group,
            Shape::Text(TextRun {
                x,
                baseline: baseline_in(top, line_height, size_pt),
                text: text.to_string(),
                face,
                size_pt,
                color,
                word_spacing_mm,
            }),
        );
    }

    /// Draws pre-wrapped lines at the cursor, breaking pages per line as needed.
    /// Returns the vertical space consumed (lines × line height).
    #[allow(clippy::too_many_arguments)]
    fn paragraph(
        &mut self,
        kind: ElementKind,
        group: Option<usize>,
        lines: &[String],
        x: f32,
        width: f32,
        face: FontFace,
        size_pt: f32,
        line_height: f32,
        color: Color,
        justify: bool,
    ) -> f32 {
        for (i, line) in lines.iter().enumerate() {
            self.cursor.ensure_space(line_height);
            let last = i + 1 == lines.len();
            let spacing = if justify && !last {
                justify_spacing(line, width, face, size_pt)
            } else {
                0.0
            };
            let top = self.cursor.y();
            self.text_at(
                kind,
                group,
                x,
                top,
                line_height,
                line,
                face,
                size_pt,
                color,
                spacing,
            );
            self.cursor.advance(line_height);
        }
        lines.len() as f32 * line_height
    }

    /// Breaks the page if the section cannot start here, then draws its title.
    ///
    /// When the whole section fits on one page it is kept together; otherwise
    /// only the title and the first body unit must share a page.
    fn begin_section(&mut self, title: &str, whole_height: f32, lead_height: f32) {
        let keep_whole = self
            .cursor
            .fits_on_fresh_page(SECTION_TITLE_HEIGHT + whole_height);
        let needed = if keep_whole {
            SECTION_TITLE_HEIGHT + whole_height
        } else {
            SECTION_TITLE_HEIGHT + lead_height
        };
        if self.cursor.ensure_space(needed) {
            debug!("Page break before section '{title}'");
        }

        let g = self.geometry();
        let top = self.cursor.y();
        self.text_at(
            ElementKind::SectionTitle,
            None,
            g.left(),
            top,
            SECTION_TITLE_LINE,
            title,
            FontFace::HelveticaBold,
            SECTION_TITLE_PT,
            palette::ACCENT,
            0.0,
        );
        let rule_y = top + SECTION_TITLE_LINE + 0.8;
        self.push(
            ElementKind::SectionRule,
            None,
            Shape::Line(Rule {
                x1: g.left(),
                y1: rule_y,
                x2: g.right(),
                y2: rule_y,
                width_mm: SECTION_RULE_WIDTH,
                color: palette::RULE,
            }),
        );
        self.cursor.advance(SECTION_TITLE_HEIGHT);
    }

    // ── Header ────────────────────────────────────────────────────────────

    fn header(&mut self, content: &ResumeContent, has_photo: bool) {
        let g = self.geometry();
        let top = self.cursor.y();
        let radius = PHOTO_SIZE / 2.0;
        let (cx, cy) = (g.left() + radius, top + radius);
        // Ring stroke stays inside the photo box.
        let ring_radius = radius - PHOTO_RING_WIDTH / 2.0;

        if has_photo {
            self.push(
                ElementKind::Photo,
                None,
                Shape::Image(ImagePlacement {
                    x: g.left(),
                    y: top,
                    size: PHOTO_SIZE,
                }),
            );
            self.push(
                ElementKind::Photo,
                None,
                Shape::Circle(Disc {
                    cx,
                    cy,
                    radius: ring_radius,
                    fill: None,
                    stroke: Some((palette::ACCENT, PHOTO_RING_WIDTH)),
                }),
            );
        } else {
            self.push(
                ElementKind::Photo,
                None,
                Shape::Circle(Disc {
                    cx,
                    cy,
                    radius: ring_radius,
                    fill: Some(palette::PLACEHOLDER),
                    stroke: Some((palette::ACCENT, PHOTO_RING_WIDTH)),
                }),
            );
            let initials = initials(&content.name);
            let width = get_metrics(FontFace::HelveticaBold).width_mm(&initials, INITIALS_PT);
            self.text_at(
                ElementKind::Photo,
                None,
                cx - width / 2.0,
                cy - NAME_LINE / 2.0,
                NAME_LINE,
                &initials,
                FontFace::HelveticaBold,
                INITIALS_PT,
                palette::SECONDARY,
                0.0,
            );
        }

        let text_x = g.left() + PHOTO_SIZE + PHOTO_TEXT_GAP;
        let text_width = g.right() - text_x;
        let name_pt = fit_size(
            FontFace::HelveticaBold,
            &content.name,
            text_width,
            NAME_PT,
            NAME_MIN_PT,
        );
        self.text_at(
            ElementKind::Name,
            None,
            text_x,
            top + 4.0,
            NAME_LINE,
            &content.name,
            FontFace::HelveticaBold,
            name_pt,
            palette::INK,
            0.0,
        );
        if !content.title.trim().is_empty() {
            let title_pt = fit_size(
                FontFace::HelveticaBold,
                &content.title,
                text_width,
                TITLE_PT,
                CONTACT_PT,
            );
            self.text_at(
                ElementKind::Title,
                None,
                text_x,
                top + 4.0 + NAME_LINE + 1.0,
                TITLE_LINE,
                &content.title,
                FontFace::HelveticaBold,
                title_pt,
                palette::SECONDARY,
                0.0,
            );
        }

        let rule_y = top + HEADER_RULE_OFFSET;
        self.push(
            ElementKind::HeaderRule,
            None,
            Shape::Line(Rule {
                x1: g.left(),
                y1: rule_y,
                x2: g.right(),
                y2: rule_y,
                width_mm: HEADER_RULE_WIDTH,
                color: palette::ACCENT,
            }),
        );
        self.cursor.advance(HEADER_ADVANCE);
    }

    // ── Contact ───────────────────────────────────────────────────────────

    fn contact(&mut self, content: &ResumeContent, labels: &ExportLabels) {
        let g = self.geometry();
        let column_width = g.content_width() / 2.0;
        let c = &content.contact;
        let l = &labels.contact;
        let rows = [
            [(&l.email, &c.email, false), (&l.phone, &c.phone, false)],
            [(&l.location, &c.location, false), (&l.linkedin, &c.linkedin, true)],
        ];

        self.cursor.ensure_space(CONTACT_LINE * 2.0);
        for row in rows {
            let top = self.cursor.y();
            for (col, (label, value, is_link)) in row.into_iter().enumerate() {
                let x = g.left() + col as f32 * column_width;
                let label_width = get_metrics(FontFace::HelveticaBold).width_mm(label, CONTACT_PT);
                self.text_at(
                    ElementKind::ContactLabel,
                    None,
                    x,
                    top,
                    CONTACT_LINE,
                    label,
                    FontFace::HelveticaBold,
                    CONTACT_PT,
                    palette::BODY,
                    0.0,
                );
                if value.trim().is_empty() {
                    continue;
                }
                let value_x = x + label_width + CONTACT_LABEL_GAP;
                let available = column_width - label_width - CONTACT_LABEL_GAP - RIGHT_COLUMN_GAP;
                let (size, color) = if is_link {
                    (CONTACT_LINK_PT, palette::ACCENT)
                } else {
                    (CONTACT_PT, palette::BODY)
                };
                let size = fit_size(FontFace::Helvetica, value, available, size, CONTACT_MIN_PT);
                self.text_at(
                    ElementKind::ContactValue,
                    None,
                    value_x,
                    top,
                    CONTACT_LINE,
                    value,
                    FontFace::Helvetica,
                    size,
                    color,
                    0.0,
                );
            }
            self.cursor.advance(CONTACT_LINE);
        }
        self.cursor.advance(SECTION_GAP);
    }

    // ── Profile ───────────────────────────────────────────────────────────

    fn profile(&mut self, title: &str, text: &str) {
        let g = self.geometry();
        let lines = get_metrics(FontFace::Helvetica).wrap_lines(text, g.content_width(), PROFILE_PT);
        let body_height = lines.len() as f32 * PROFILE_LINE;

        self.begin_section(title, body_height, PROFILE_LINE);
        let consumed = self.paragraph(
            ElementKind::ProfileLine,
            None,
            &lines,
            g.left(),
            g.content_width(),
            FontFace::Helvetica,
            PROFILE_PT,
            PROFILE_LINE,
            palette::BODY,
            true,
        );
        debug!("Profile used {} line(s), {consumed:.1}mm", lines.len());
        self.cursor.advance(SECTION_GAP);
    }

    // ── Skills ────────────────────────────────────────────────────────────

    fn skills(&mut self, title: &str, content: &ResumeContent) {
        let g = self.geometry();
        let column_width = (g.content_width() - COLUMN_GAP) / 2.0;
        let columns_x = [g.left(), g.left() + column_width + COLUMN_GAP];
        let metrics = get_metrics(FontFace::Helvetica);
        let heading_metrics = get_metrics(FontFace::HelveticaBold);

        let blocks: Vec<SkillBlock> = content
            .skills
            .iter()
            .enumerate()
            .map(|(group, skill_group)| SkillBlock {
                group,
                heading: heading_metrics.wrap_lines(
                    &skill_group.label,
                    column_width,
                    SKILL_CATEGORY_PT,
                ),
                lines: metrics.wrap_lines(&skill_group.skills.join(", "), column_width, SKILL_PT),
            })
            .collect();

        let rows: Vec<&[SkillBlock]> = blocks.chunks(2).collect();
        let row_heights: Vec<f32> = rows
            .iter()
            .map(|row| row.iter().map(SkillBlock::height).fold(0.0, f32::max))
            .collect();
        let whole_height = row_heights.iter().sum::<f32>()
            + rows.len().saturating_sub(1) as f32 * SKILL_ROW_GAP;

        // An oversized first row flows, so only its first lines must follow the title.
        let lead = if self.cursor.fits_on_fresh_page(row_heights[0]) {
            row_heights[0]
        } else {
            SKILL_CATEGORY_LINE + SKILL_LINE
        };
        self.begin_section(title, whole_height, lead);

        for (row_index, (row, row_height)) in rows.iter().zip(&row_heights).enumerate() {
            if self.cursor.fits_on_fresh_page(*row_height) {
                self.cursor.ensure_space(*row_height);
                self.skill_row(row, columns_x);
            } else {
                // A category taller than a page cannot sit in a column; stack it.
                for block in row.iter() {
                    self.cursor.ensure_space(SKILL_CATEGORY_LINE + SKILL_LINE);
                    self.paragraph(
                        ElementKind::SkillCategory,
                        Some(block.group),
                        &block.heading,
                        columns_x[0],
                        column_width,
                        FontFace::HelveticaBold,
                        SKILL_CATEGORY_PT,
                        SKILL_CATEGORY_LINE,
                        palette::SECONDARY,
                        false,
                    );
                    self.paragraph(
                        ElementKind::SkillLine,
                        Some(block.group),
                        &block.lines,
                        columns_x[0],
                        column_width,
                        FontFace::Helvetica,
                        SKILL_PT,
                        SKILL_LINE,
                        palette::BODY,
                        false,
                    );
                }
            }
            if row_index + 1 < rows.len() {
                self.cursor.advance(SKILL_ROW_GAP);
            }
        }
        self.cursor.advance(SECTION_GAP);
    }

    /// Places a left/right pair from the same top, then resyncs the cursor to
    /// the lower column end.
    fn skill_row(&mut self, row: &[SkillBlock], columns_x: [f32; 2]) {
        let row_top = self.cursor.y();
        let mut column_ends = [row_top; 2];

        for (column, block) in row.iter().enumerate() {
            let x = columns_x[column];
            let mut y = row_top;
            for line in &block.heading {
                self.text_at(
                    ElementKind::SkillCategory,
                    Some(block.group),
                    x,
                    y,
                    SKILL_CATEGORY_LINE,
                    line,
                    FontFace::HelveticaBold,
                    SKILL_CATEGORY_PT,
                    palette::SECONDARY,
                    0.0,
                );
                y += SKILL_CATEGORY_LINE;
            }
            for line in &block.lines {
                self.text_at(
                    ElementKind::SkillLine,
                    Some(block.group),
                    x,
                    y,
                    SKILL_LINE,
                    line,
                    FontFace::Helvetica,
                    SKILL_PT,
                    palette::BODY,
                    0.0,
                );
                y += SKILL_LINE;
            }
            column_ends[column] = y;
        }

        self.cursor.sync_to(column_ends[0].max(column_ends[1]));
    }

    // ── Experience ────────────────────────────────────────────────────────

    fn experience(&mut self, title: &str, entries: &[ExperienceEntry]) {
        let g = self.geometry();
        let metrics = get_metrics(FontFace::Helvetica);
        let bullet_width = g.content_width() - BULLET_INDENT;

        let blocks: Vec<EntryBlock<'_>> = entries
            .iter()
            .map(|entry| EntryBlock {
                entry,
                description: entry
                    .description()
                    .map(|d| metrics.wrap_lines(d, g.content_width(), BODY_PT))
                    .unwrap_or_default(),
                bullets: entry
                    .highlights
                    .iter()
                    .map(|h| metrics.wrap_lines(h, bullet_width, BODY_PT))
                    .filter(|lines| !lines.is_empty())
                    .collect(),
            })
            .collect();

        let lead = blocks[0].lead_height();
        self.begin_section(title, lead, lead);

        for (index, block) in blocks.iter().enumerate() {
            if self.cursor.ensure_space(block.lead_height()) {
                debug!("Page break before entry '{}'", block.entry.company);
            }
            self.entry(index, block);
            if index + 1 < blocks.len() {
                self.cursor.advance(ENTRY_GAP);
            }
        }
    }

    fn entry(&mut self, index: usize, block: &EntryBlock<'_>) {
        let g = self.geometry();
        let group = Some(index);
        let entry = block.entry;

        // Company with right-aligned period
        let top = self.cursor.y();
        let period_width = get_metrics(FontFace::Helvetica).width_mm(&entry.period, PERIOD_PT);
        let (company, company_pt) = fit_line(
            FontFace::HelveticaBold,
            &entry.company,
            g.content_width() - period_width - RIGHT_COLUMN_GAP,
            COMPANY_PT,
            BODY_PT,
        );
        self.text_at(
            ElementKind::Company,
            group,
            g.left(),
            top,
            COMPANY_LINE,
            &company,
            FontFace::HelveticaBold,
            company_pt,
            palette::INK,
            0.0,
        );
        if !entry.period.trim().is_empty() {
            self.text_at(
                ElementKind::Period,
                group,
                g.right() - period_width,
                top,
                COMPANY_LINE,
                &entry.period,
                FontFace::Helvetica,
                PERIOD_PT,
                palette::MUTED,
                0.0,
            );
        }
        self.cursor.advance(COMPANY_LINE);

        let top = self.cursor.y();
        let (position, position_pt) = fit_line(
            FontFace::HelveticaBold,
            &entry.position,
            g.content_width(),
            POSITION_PT,
            BODY_PT,
        );
        self.text_at(
            ElementKind::Position,
            group,
            g.left(),
            top,
            POSITION_LINE,
            &position,
            FontFace::HelveticaBold,
            position_pt,
            palette::SECONDARY,
            0.0,
        );
        self.cursor.advance(POSITION_LINE);

        if block.has_project_line() {
            let top = self.cursor.y();
            let period_width = entry
                .project_period()
                .map(|period| get_metrics(FontFace::Helvetica).width_mm(period, PROJECT_PERIOD_PT))
                .unwrap_or(0.0);
            if let Some(project) = entry.project() {
                let (project, project_pt) = fit_line(
                    FontFace::HelveticaBold,
                    project,
                    g.content_width() - period_width - RIGHT_COLUMN_GAP,
                    PROJECT_PT,
                    PROJECT_PERIOD_PT,
                );
                self.text_at(
                    ElementKind::Project,
                    group,
                    g.left(),
                    top,
                    PROJECT_LINE,
                    &project,
                    FontFace::HelveticaBold,
                    project_pt,
                    palette::SECONDARY,
                    0.0,
                );
            }
            if let Some(period) = entry.project_period() {
                self.text_at(
                    ElementKind::ProjectPeriod,
                    group,
                    g.right() - period_width,
                    top,
                    PROJECT_LINE,
                    period,
                    FontFace::Helvetica,
                    PROJECT_PERIOD_PT,
                    palette::MUTED,
                    0.0,
                );
            }
            self.cursor.advance(PROJECT_LINE);
        }

        if !block.description.is_empty() {
            self.paragraph(
                ElementKind::DescriptionLine,
                group,
                &block.description,
                g.left(),
                g.content_width(),
                FontFace::Helvetica,
                BODY_PT,
                BODY_LINE,
                palette::BODY,
                true,
            );
            self.cursor.advance(DESCRIPTION_GAP);
        }

        for lines in &block.bullets {
            let height = lines.len() as f32 * BODY_LINE;
            let needed = if self.cursor.fits_on_fresh_page(height) {
                height
            } else {
                BODY_LINE
            };
            self.cursor.ensure_space(needed);

            let top = self.cursor.y();
            self.text_at(
                ElementKind::BulletMarker,
                group,
                g.left() + BULLET_MARKER_OFFSET,
                top,
                BODY_LINE,
                "•",
                FontFace::Helvetica,
                BODY_PT,
                palette::SECONDARY,
                0.0,
            );
            self.paragraph(
                ElementKind::BulletLine,
                group,
                lines,
                g.left() + BULLET_INDENT,
                g.content_width() - BULLET_INDENT,
                FontFace::Helvetica,
                BODY_PT,
                BODY_LINE,
                palette::BODY,
                false,
            );
            self.cursor.advance(BULLET_GAP);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Baseline that vertically centres a line of `size_pt` text in its line box.
fn baseline_in(top: f32, line_height: f32, size_pt: f32) -> f32 {
    let size_mm = size_pt * PT_TO_MM;
    top + (line_height - size_mm) / 2.0 + size_mm * 0.8
}

/// Extra per-gap spacing that stretches `line` to `width`.
fn justify_spacing(line: &str, width: f32, face: FontFace, size_pt: f32) -> f32 {
    let gaps = line.matches(' ').count();
    if gaps == 0 {
        return 0.0;
    }
    let natural = get_metrics(face).width_mm(line, size_pt);
    ((width - natural) / gaps as f32).max(0.0)
}

/// Largest size in whole points (down to `min_pt`) at which `text` fits `width`.
fn fit_size(face: FontFace, text: &str, width: f32, max_pt: f32, min_pt: f32) -> f32 {
    let metrics = get_metrics(face);
    let mut size = max_pt;
    while size > min_pt && metrics.width_mm(text, size) > width {
        size -= 1.0;
    }
    size.max(min_pt)
}

/// Like `fit_size`, but a line still too wide at `min_pt` is cut and ends in an ellipsis.
fn fit_line(face: FontFace, text: &str, width: f32, max_pt: f32, min_pt: f32) -> (String, f32) {
    let size = fit_size(face, text, width, max_pt, min_pt);
    let metrics = get_metrics(face);
    if metrics.width_mm(text, size) <= width {
        return (text.to_string(), size);
    }
    let mut kept: Vec<char> = text.chars().collect();
    while kept.pop().is_some() {
        let prefix: String = kept.iter().collect();
        let candidate = format!("{}…", prefix.trim_end());
        if metrics.width_mm(&candidate, size) <= width {
            return (candidate, size);
        }
    }
    ("…".to_string(), size)
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Contact, SkillGroup};

    fn make_entry(company: &str, description: Option<&str>, highlights: &[&str]) -> ExperienceEntry {
        ExperienceEntry {
            company: company.to_string(),
            position: "Software Engineer".to_string(),
            period: "2020 - 2023".to_string(),
            project: Some("Billing".to_string()),
            project_period: None,
            description: description.map(str::to_string),
            highlights: highlights.iter().map(|h| h.to_string()).collect(),
        }
    }

    fn make_group(key: &str, count: usize) -> SkillGroup {
        SkillGroup {
            key: key.to_string(),
            label: key.to_uppercase(),
            skills: (0..count).map(|i| format!("Skill{i}")).collect(),
        }
    }

    fn make_content() -> ResumeContent {
        ResumeContent {
            name: "Ana María López".to_string(),
            title: "Backend Engineer".to_string(),
            profile: "Engineer building reliable services.".to_string(),
            contact: Contact {
                email: "ana@example.com".to_string(),
                phone: "+34 600 000 000".to_string(),
                location: "Madrid".to_string(),
                linkedin: "https://linkedin.com/in/ana".to_string(),
            },
            skills: vec![make_group("backend", 4), make_group("cloud", 3)],
            experience: vec![
                make_entry("Acme", Some("Payments team."), &["Shipped things.", "Fixed things."]),
                make_entry("Globex", None, &[]),
            ],
        }
    }

    fn compose(content: &ResumeContent) -> LaidOutDocument {
        compose_resume(content, &ExportLabels::default(), &ComposeOptions::default()).unwrap()
    }

    fn section_title_baselines(doc: &LaidOutDocument) -> Vec<(usize, f32)> {
        doc.ops_of(ElementKind::SectionTitle)
            .map(|(page, op)| (page, op.text().unwrap().baseline))
            .collect()
    }

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut content = make_content();
        content.name = "  ".to_string();
        let result = compose_resume(&content, &ExportLabels::default(), &ComposeOptions::default());
        assert_eq!(result.unwrap_err(), LayoutError::MissingField("name"));
    }

    #[test]
    fn test_absent_description_renders_nothing_for_entry() {
        let doc = compose(&make_content());
        let for_entry = |group| {
            doc.ops_of(ElementKind::DescriptionLine)
                .filter(|(_, op)| op.group == Some(group))
                .count()
        };
        assert!(for_entry(0) > 0);
        assert_eq!(for_entry(1), 0);
    }

    #[test]
    fn test_empty_highlights_render_no_bullet_markers() {
        let doc = compose(&make_content());
        let markers = |group| {
            doc.ops_of(ElementKind::BulletMarker)
                .filter(|(_, op)| op.group == Some(group))
                .count()
        };
        assert_eq!(markers(0), 2);
        assert_eq!(markers(1), 0);
    }

    #[test]
    fn test_absent_project_renders_no_project_line() {
        let mut content = make_content();
        content.experience[1].project = None;
        let doc = compose(&content);
        assert!(doc
            .ops_of(ElementKind::Project)
            .all(|(_, op)| op.group != Some(1)));
        assert_eq!(doc.ops_of(ElementKind::ProjectPeriod).count(), 0);
    }

    #[test]
    fn test_period_is_right_aligned() {
        let doc = compose(&make_content());
        let (_, op) = doc.ops_of(ElementKind::Period).next().unwrap();
        let run = op.text().unwrap();
        let width = get_metrics(run.face).width_mm(&run.text, run.size_pt);
        assert!((run.x + width - doc.geometry.right()).abs() < 1e-3);
    }

    #[test]
    fn test_odd_skill_category_sits_alone_in_column_a() {
        let mut content = make_content();
        content.skills = vec![make_group("a", 12), make_group("b", 2), make_group("c", 3)];
        let doc = compose(&content);

        let heading = |group| {
            doc.ops_of(ElementKind::SkillCategory)
                .find(|(_, op)| op.group == Some(group))
                .map(|(_, op)| op.text().unwrap().clone())
                .unwrap()
        };
        let (a, b, c) = (heading(0), heading(1), heading(2));

        // Column B starts level with column A
        assert_eq!(a.baseline, b.baseline);
        assert!(b.x > a.x);
        // Last category returns to column A below the taller of the pair
        assert_eq!(c.x, a.x);
        let lowest_row_one = doc
            .ops()
            .filter(|(_, op)| matches!(op.group, Some(0) | Some(1)))
            .filter(|(_, op)| op.kind == ElementKind::SkillLine)
            .map(|(_, op)| op.bottom())
            .fold(0.0, f32::max);
        assert!(c.baseline > lowest_row_one);
        assert_eq!(doc.ops_of(ElementKind::SkillCategory).count(), 3);
    }

    #[test]
    fn test_row_resyncs_to_lower_column() {
        let mut short_left = make_content();
        short_left.skills = vec![make_group("a", 2), make_group("b", 20), make_group("c", 1)];
        let mut short_right = make_content();
        short_right.skills = vec![make_group("a", 20), make_group("b", 2), make_group("c", 1)];

        let third_baseline = |doc: &LaidOutDocument| {
            doc.ops_of(ElementKind::SkillCategory)
                .find(|(_, op)| op.group == Some(2))
                .map(|(_, op)| op.text().unwrap().baseline)
                .unwrap()
        };
        let left = third_baseline(&compose(&short_left));
        let right = third_baseline(&compose(&short_right));
        assert!((left - right).abs() < 1e-3);
    }

    #[test]
    fn test_longer_profile_moves_next_section_down_by_line_count() {
        let mut short = make_content();
        short.profile = long_text(20);
        let mut long = make_content();
        long.profile = long_text(90);

        let short_doc = compose(&short);
        let long_doc = compose(&long);
        let short_lines = short_doc.ops_of(ElementKind::ProfileLine).count();
        let long_lines = long_doc.ops_of(ElementKind::ProfileLine).count();
        assert!(long_lines > short_lines);

        let (p1, y1) = section_title_baselines(&short_doc)[1];
        let (p2, y2) = section_title_baselines(&long_doc)[1];
        assert_eq!((p1, p2), (0, 0));
        let expected = (long_lines - short_lines) as f32 * PROFILE_LINE;
        assert!((y2 - y1 - expected).abs() < 1e-3, "{} vs {}", y2 - y1, expected);
    }

    #[test]
    fn test_many_entries_break_pages_and_stay_above_margin() {
        let mut content = make_content();
        content.experience = (0..14)
            .map(|i| {
                make_entry(
                    &format!("Company {i}"),
                    Some(long_text(40).as_str()),
                    &[long_text(30).as_str(), long_text(12).as_str(), long_text(25).as_str()],
                )
            })
            .collect();
        let doc = compose(&content);
        let g = doc.geometry;

        assert!(doc.pages.len() > 1);
        for (_, op) in doc.ops() {
            assert!(op.bottom() <= g.bottom() + 1e-3, "{:?} below margin", op.kind);
            assert!(op.top() >= g.top() - 1e-3, "{:?} above margin", op.kind);
        }
    }

    #[test]
    fn test_company_header_never_separated_from_first_line() {
        let mut content = make_content();
        content.experience = (0..14)
            .map(|i| make_entry(&format!("Company {i}"), None, &[long_text(30).as_str()]))
            .collect();
        let doc = compose(&content);
        for (page, op) in doc.ops_of(ElementKind::Company) {
            let group = op.group;
            let first_bullet_page = doc
                .ops_of(ElementKind::BulletLine)
                .find(|(_, b)| b.group == group)
                .map(|(p, _)| p)
                .unwrap();
            assert_eq!(page, first_bullet_page);
        }
    }

    #[test]
    fn test_page_break_resets_to_top_margin() {
        let mut content = make_content();
        content.experience = (0..14)
            .map(|i| make_entry(&format!("Company {i}"), Some(long_text(30).as_str()), &[long_text(20).as_str()]))
            .collect();
        let doc = compose(&content);
        let g = doc.geometry;
        for page in doc.pages.iter().skip(1) {
            let first_top = page.ops.iter().map(DrawOp::top).fold(f32::MAX, f32::min);
            assert!(first_top >= g.top() - 1e-3);
            assert!(first_top < g.top() + 3.0, "first op starts at {first_top}");
        }
    }

    #[test]
    fn test_profile_taller_than_page_flows_across_pages() {
        let mut content = make_content();
        content.profile = long_text(2000);
        let doc = compose(&content);
        let g = doc.geometry;
        let pages: std::collections::BTreeSet<usize> =
            doc.ops_of(ElementKind::ProfileLine).map(|(p, _)| p).collect();
        assert!(pages.len() > 1);
        assert!(doc.ops().all(|(_, op)| op.bottom() <= g.bottom() + 1e-3));
    }

    #[test]
    fn test_section_kept_whole_when_it_fits_a_fresh_page() {
        let mut content = make_content();
        // Fill most of page one so the skills section cannot fit below the profile
        content.profile = long_text(430);
        let doc = compose(&content);
        let titles = section_title_baselines(&doc);
        let skill_pages: std::collections::BTreeSet<usize> =
            doc.ops_of(ElementKind::SkillLine).map(|(p, _)| p).collect();
        assert_eq!(skill_pages.len(), 1);
        assert_eq!(Some(&titles[1].0), skill_pages.iter().next());
    }

    #[test]
    fn test_placeholder_drawn_without_photo() {
        let doc = compose(&make_content());
        let initials = doc
            .ops_of(ElementKind::Photo)
            .find_map(|(_, op)| op.text().map(|t| t.text.clone()));
        assert_eq!(initials.as_deref(), Some("AM"));
        assert!(!doc
            .ops()
            .any(|(_, op)| matches!(op.shape, Shape::Image(_))));
    }

    #[test]
    fn test_photo_placed_when_available() {
        let options = ComposeOptions {
            has_photo: true,
            ..ComposeOptions::default()
        };
        let doc = compose_resume(&make_content(), &ExportLabels::default(), &options).unwrap();
        assert_eq!(
            doc.ops()
                .filter(|(_, op)| matches!(op.shape, Shape::Image(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_contact_block_has_four_labelled_fields() {
        let doc = compose(&make_content());
        assert_eq!(doc.ops_of(ElementKind::ContactLabel).count(), 4);
        let values: Vec<_> = doc.ops_of(ElementKind::ContactValue).collect();
        assert_eq!(values.len(), 4);
        let link = values[3].1.text().unwrap();
        assert_eq!(link.color, palette::ACCENT);
    }

    #[test]
    fn test_justified_lines_except_last() {
        let mut content = make_content();
        content.profile = long_text(60);
        let doc = compose(&content);
        let lines: Vec<_> = doc
            .ops_of(ElementKind::ProfileLine)
            .map(|(_, op)| op.text().unwrap().word_spacing_mm)
            .collect();
        assert!(lines.len() > 1);
        assert_eq!(*lines.last().unwrap(), 0.0);
        assert!(lines[..lines.len() - 1].iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn test_metadata_derived_from_content() {
        let doc = compose(&make_content());
        assert_eq!(doc.metadata.title, "Ana María López - Backend Engineer");
        assert_eq!(doc.metadata.author, "Ana María López");
        assert!(doc.metadata.keywords.starts_with("Skill0, Skill1"));
        assert!(doc.metadata.creator.starts_with("site"));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let content = make_content();
        assert_eq!(compose(&content), compose(&content));
    }

    #[test]
    fn test_long_skill_heading_wraps_inside_its_column() {
        let mut content = make_content();
        let mut wide = make_group("cloud", 3);
        wide.label = "Infraestructura como código y automatización de plataformas".to_string();
        content.skills = vec![wide, make_group("tools", 2)];
        let doc = compose(&content);
        let g = doc.geometry;
        let column_width = (g.content_width() - COLUMN_GAP) / 2.0;
        let column_b = g.left() + column_width + COLUMN_GAP;

        let headings: Vec<TextRun> = doc
            .ops_of(ElementKind::SkillCategory)
            .filter(|(_, op)| op.group == Some(0))
            .map(|(_, op)| op.text().unwrap().clone())
            .collect();
        assert!(headings.len() > 1);

        let column_a = doc.ops().filter(|(_, op)| {
            op.group == Some(0)
                && matches!(op.kind, ElementKind::SkillCategory | ElementKind::SkillLine)
        });
        for (_, op) in column_a {
            let run = op.text().unwrap();
            let right = run.x + get_metrics(run.face).width_mm(&run.text, run.size_pt);
            assert!(right <= column_b - COLUMN_GAP + 1e-3, "'{}' ends at {right}", run.text);
        }

        let (_, beside) = doc
            .ops_of(ElementKind::SkillCategory)
            .find(|(_, op)| op.group == Some(1))
            .unwrap();
        assert_eq!(beside.text().unwrap().baseline, headings[0].baseline);
    }

    #[test]
    fn test_oversized_skill_category_flows_across_pages() {
        let mut content = make_content();
        content.skills = vec![make_group("huge", 900), make_group("small", 2)];
        let doc = compose(&content);
        let g = doc.geometry;

        let skill_pages: std::collections::BTreeSet<usize> =
            doc.ops_of(ElementKind::SkillLine).map(|(p, _)| p).collect();
        assert!(skill_pages.len() > 1);
        for (_, op) in doc.ops() {
            assert!(op.bottom() <= g.bottom() + 1e-3, "{:?} below margin", op.kind);
        }

        // Both categories of the oversized row are stacked in column A
        assert!(doc
            .ops_of(ElementKind::SkillCategory)
            .all(|(_, op)| op.text().unwrap().x == g.left()));

        let (last_page, last_bottom) = doc
            .ops_of(ElementKind::SkillLine)
            .map(|(page, op)| (page, op.bottom()))
            .last()
            .unwrap();
        let (title_page, title_baseline) = *section_title_baselines(&doc).last().unwrap();
        assert!(
            title_page > last_page || (title_page == last_page && title_baseline > last_bottom),
            "experience starts at page {title_page} y {title_baseline}"
        );
    }

    #[test]
    fn test_long_project_name_stops_before_project_period() {
        let mut content = make_content();
        content.experience[0].project = Some(long_text(30));
        content.experience[0].project_period = Some("2021 - 2023".to_string());
        let doc = compose(&content);

        let in_entry = |kind| {
            doc.ops_of(kind)
                .find(|(_, op)| op.group == Some(0))
                .map(|(_, op)| op.text().unwrap().clone())
                .unwrap()
        };
        let project = in_entry(ElementKind::Project);
        let period = in_entry(ElementKind::ProjectPeriod);

        let right = project.x + get_metrics(project.face).width_mm(&project.text, project.size_pt);
        assert!(right <= period.x - RIGHT_COLUMN_GAP + 1e-3);
        assert!(project.text.ends_with('…'));
        assert!(project.size_pt >= PROJECT_PERIOD_PT);
    }

    #[test]
    fn test_fit_line_keeps_text_that_fits() {
        let (text, size) = fit_line(FontFace::HelveticaBold, "Acme", 100.0, COMPANY_PT, BODY_PT);
        assert_eq!(text, "Acme");
        assert_eq!(size, COMPANY_PT);
    }

    #[test]
    fn test_initials_uses_first_two_words() {
        assert_eq!(initials("lucía fernández ortega"), "LF");
        assert_eq!(initials("Prince"), "P");
    }
}
