//! PDF serialization of a laid-out document.
//!
//! Produces a vector PDF: text is drawn with the base-14 Helvetica faces so it
//! stays selectable and searchable, rules and discs are path operators, and
//! the optional profile photo is a single RGB image XObject clipped to a circle.

pub mod encoding;
pub mod photo;

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::debug;

use crate::layout::document::{Disc, ImagePlacement, LaidOutDocument, Rule, Shape, TextRun};
use crate::layout::font_metrics::FontFace;
use crate::layout::geometry::{Color, PageGeometry};

pub use photo::ProfileImage;

/// PostScript points per millimetre.
const MM_TO_PT: f32 = 72.0 / 25.4;
/// Control-point ratio for approximating a quarter circle with a cubic Bézier.
const KAPPA: f32 = 0.552_284_8;
const PHOTO_RESOURCE: &str = "Im1";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to encode page content: {0}")]
    Content(String),

    #[error("Failed to write PDF: {0}")]
    Save(String),
}

/// Serializes `doc` into PDF bytes. `photo` is drawn wherever the layout placed an image.
pub fn write_pdf(
    doc: &LaidOutDocument,
    photo: Option<&ProfileImage>,
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, PdfError> {
    let mut pdf = Document::with_version("1.7");
    let pages_id = pdf.new_object_id();

    let mut fonts = Dictionary::new();
    for face in [FontFace::Helvetica, FontFace::HelveticaBold] {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }

    let mut resources = dictionary! { "Font" => fonts };
    if let Some(photo) = photo {
        let image_id = pdf.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(photo.width),
                "Height" => i64::from(photo.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            photo.rgb.clone(),
        ));
        resources.set("XObject", dictionary! { PHOTO_RESOURCE => image_id });
    }
    let resources_id = pdf.add_object(resources);

    let geometry = doc.geometry;
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(geometry.width_mm * MM_TO_PT),
        Object::Real(geometry.height_mm * MM_TO_PT),
    ];

    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let mut operations = Vec::new();
        for op in &page.ops {
            match &op.shape {
                Shape::Text(run) => text_ops(&mut operations, run, &geometry),
                Shape::Line(rule) => rule_ops(&mut operations, rule, &geometry),
                Shape::Circle(disc) => disc_ops(&mut operations, disc, &geometry),
                // A placement without a decoded photo draws nothing.
                Shape::Image(placement) if photo.is_some() => {
                    image_ops(&mut operations, placement, &geometry)
                }
                Shape::Image(_) => {}
            }
        }
        let content = Content { operations }
            .encode()
            .map_err(|e| PdfError::Content(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(Dictionary::new(), content));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = info_dictionary(&mut pdf, doc, created_at);
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);

    pdf.compress();
    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)
        .map_err(|e| PdfError::Save(e.to_string()))?;

    debug!(
        "Serialized {} page(s) into {} bytes",
        doc.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn info_dictionary(pdf: &mut Document, doc: &LaidOutDocument, created_at: DateTime<Utc>) -> ObjectId {
    let meta = &doc.metadata;
    let date = encoding::text_string(&encoding::pdf_date(created_at));
    pdf.add_object(dictionary! {
        "Title" => encoding::text_string(&meta.title),
        "Author" => encoding::text_string(&meta.author),
        "Subject" => encoding::text_string(&meta.subject),
        "Keywords" => encoding::text_string(&meta.keywords),
        "Creator" => encoding::text_string(&meta.creator),
        "Producer" => encoding::text_string("lopdf"),
        "CreationDate" => date,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Content stream builders
// ────────────────────────────────────────────────────────────────────────────

fn pt(mm: f32) -> Object {
    Object::Real(mm * MM_TO_PT)
}

/// Converts a top-down millimetre y into PDF user space.
fn flip_y(y_mm: f32, geometry: &PageGeometry) -> Object {
    Object::Real((geometry.height_mm - y_mm) * MM_TO_PT)
}

fn color_operands(color: Color) -> Vec<Object> {
    color.unit().into_iter().map(Object::Real).collect()
}

fn text_ops(ops: &mut Vec<Operation>, run: &TextRun, geometry: &PageGeometry) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![run.face.resource_name().into(), Object::Real(run.size_pt)],
    ));
    ops.push(Operation::new("rg", color_operands(run.color)));
    ops.push(Operation::new("Tw", vec![pt(run.word_spacing_mm)]));
    ops.push(Operation::new(
        "Td",
        vec![pt(run.x), flip_y(run.baseline, geometry)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(
            encoding::encode_win_ansi(&run.text),
            lopdf::StringFormat::Literal,
        )],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule_ops(ops: &mut Vec<Operation>, rule: &Rule, geometry: &PageGeometry) {
    ops.push(Operation::new("w", vec![pt(rule.width_mm)]));
    ops.push(Operation::new("RG", color_operands(rule.color)));
    ops.push(Operation::new(
        "m",
        vec![pt(rule.x1), flip_y(rule.y1, geometry)],
    ));
    ops.push(Operation::new(
        "l",
        vec![pt(rule.x2), flip_y(rule.y2, geometry)],
    ));
    ops.push(Operation::new("S", vec![]));
}

/// Appends a closed circular path made of four Bézier quadrants.
fn circle_path(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32, geometry: &PageGeometry) {
    let k = r * KAPPA;
    let point = |x: f32, y: f32| vec![pt(x), flip_y(y, geometry)];
    let curve = |x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32| {
        let mut operands = point(x1, y1);
        operands.extend(point(x2, y2));
        operands.extend(point(x3, y3));
        Operation::new("c", operands)
    };

    ops.push(Operation::new("m", point(cx + r, cy)));
    ops.push(curve(cx + r, cy + k, cx + k, cy + r, cx, cy + r));
    ops.push(curve(cx - k, cy + r, cx - r, cy + k, cx - r, cy));
    ops.push(curve(cx - r, cy - k, cx - k, cy - r, cx, cy - r));
    ops.push(curve(cx + k, cy - r, cx + r, cy - k, cx + r, cy));
    ops.push(Operation::new("h", vec![]));
}

fn disc_ops(ops: &mut Vec<Operation>, disc: &Disc, geometry: &PageGeometry) {
    if let Some(fill) = disc.fill {
        ops.push(Operation::new("rg", color_operands(fill)));
    }
    if let Some((stroke, width)) = disc.stroke {
        ops.push(Operation::new("RG", color_operands(stroke)));
        ops.push(Operation::new("w", vec![pt(width)]));
    }
    circle_path(ops, disc.cx, disc.cy, disc.radius, geometry);
    let paint = match (disc.fill.is_some(), disc.stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    };
    ops.push(Operation::new(paint, vec![]));
}

fn image_ops(ops: &mut Vec<Operation>, placement: &ImagePlacement, geometry: &PageGeometry) {
    let r = placement.size / 2.0;
    ops.push(Operation::new("q", vec![]));
    circle_path(ops, placement.x + r, placement.y + r, r, geometry);
    ops.push(Operation::new("W", vec![]));
    ops.push(Operation::new("n", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            pt(placement.size),
            Object::Integer(0),
            Object::Integer(0),
            pt(placement.size),
            pt(placement.x),
            flip_y(placement.y + placement.size, geometry),
        ],
    ));
    ops.push(Operation::new("Do", vec![PHOTO_RESOURCE.into()]));
    ops.push(Operation::new("Q", vec![]));
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
