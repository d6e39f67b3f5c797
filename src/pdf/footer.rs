//! Footer overlay: rule, report title and "Page k of N"
//!
//! The footer is drawn by a Form XObject appended after the page's own
//! content. The original content streams are left byte-for-byte intact and
//! only bracketed by a `q`/`Q` pair so their graphics state cannot leak into
//! the footer.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{FooterStyle, PageSize};
use crate::pdf::font::{encode_win_ansi, StandardFont};
use crate::pdf::source::{media_box, page_rotation};

/// Title and position stamped onto one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterSpec {
    report_title: String,
    page_number: usize,
    total_pages: usize,
}

impl FooterSpec {
    /// `page_number` is 1-based and must not exceed `total_pages`
    pub fn new(report_title: impl Into<String>, page_number: usize, total_pages: usize) -> Result<Self> {
        if page_number == 0 || page_number > total_pages {
            return Err(Error::InvalidRequest(format!(
                "page number {page_number} outside 1..={total_pages}"
            )));
        }
        Ok(Self {
            report_title: report_title.into(),
            page_number,
            total_pages,
        })
    }

    pub fn report_title(&self) -> &str {
        &self.report_title
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// The right-hand footer text
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.total_pages)
    }
}

/// A positioned line of footer text
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Resolved footer geometry for one page, relative to the MediaBox origin
#[derive(Debug, Clone, PartialEq)]
pub struct FooterLayout {
    pub rule_from: f32,
    pub rule_to: f32,
    pub rule_y: f32,
    /// `None` when the title is empty
    pub title: Option<TextRun>,
    pub page_label: TextRun,
}

impl FooterLayout {
    pub fn compute(size: PageSize, spec: &FooterSpec, style: &FooterStyle) -> Result<Self> {
        let overlay_error = |reason: String| Error::Overlay {
            page_number: spec.page_number,
            width: size.width,
            height: size.height,
            reason,
        };

        if size.height < style.band_height {
            return Err(overlay_error(format!(
                "page is shorter than the {:.1} pt footer band",
                style.band_height
            )));
        }

        let content_width = size.width - 2.0 * style.margin;
        let label = spec.page_label();
        let label_width = StandardFont::Helvetica.text_width(&label, style.font_size);
        if label_width > content_width {
            return Err(overlay_error(format!(
                "page is too narrow for \"{label}\""
            )));
        }

        let title = if spec.report_title.is_empty() {
            None
        } else {
            if let Err(c) = encode_win_ansi(&spec.report_title) {
                return Err(overlay_error(format!(
                    "report title contains {c:?}, which Helvetica cannot show"
                )));
            }
            let title_width = StandardFont::Helvetica.text_width(&spec.report_title, style.font_size);
            let available = content_width - label_width - style.gap;
            if title_width > available {
                return Err(overlay_error(format!(
                    "report title does not fit: needs {title_width:.1} pt, {:.1} pt left beside \"{label}\"",
                    available.max(0.0)
                )));
            }
            Some(TextRun {
                text: spec.report_title.clone(),
                x: style.margin,
                y: style.baseline_y,
            })
        };

        Ok(Self {
            rule_from: style.margin,
            rule_to: size.width - style.margin,
            rule_y: style.rule_y,
            title,
            page_label: TextRun {
                x: size.width - style.margin - label_width,
                y: style.baseline_y,
                text: label,
            },
        })
    }

    fn content(&self, style: &FooterStyle) -> Result<Content> {
        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("G", vec![Object::Real(style.rule_gray)]),
            Operation::new("w", vec![Object::Real(style.rule_width)]),
            Operation::new("m", vec![Object::Real(self.rule_from), Object::Real(self.rule_y)]),
            Operation::new("l", vec![Object::Real(self.rule_to), Object::Real(self.rule_y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("g", vec![0.into()]),
        ];

        for run in self.title.iter().chain(std::iter::once(&self.page_label)) {
            let text = encode_win_ansi(&run.text).map_err(|c| {
                Error::InvalidRequest(format!("no WinAnsi glyph for {c:?} in {:?}", run.text))
            })?;
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), Object::Real(style.font_size)]));
            ops.push(Operation::new("Td", vec![Object::Real(run.x), Object::Real(run.y)]));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(text, lopdf::StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }

        Ok(Content { operations: ops })
    }
}

/// Stamps footers onto pages of one output document
///
/// Holds the shared Helvetica font object; use one stamper per document.
#[derive(Debug)]
pub struct FooterStamper {
    style: FooterStyle,
    font_id: Option<ObjectId>,
}

impl FooterStamper {
    pub fn new(style: FooterStyle) -> Self {
        Self {
            style,
            font_id: None,
        }
    }

    /// Overlay the footer described by `spec` onto `page_id`
    ///
    /// The footer follows `/Rotate`, so it sits on the bottom edge of the
    /// page as displayed. Not idempotent: stamping a page twice prints two
    /// footers.
    pub fn stamp(&mut self, doc: &mut Document, page_id: ObjectId, spec: &FooterSpec) -> Result<()> {
        let rect = media_box(doc, page_id).unwrap_or_else(|| {
            debug!(?page_id, "page has no MediaBox, assuming Letter");
            [0.0, 0.0, PageSize::letter().width, PageSize::letter().height]
        });
        let size = PageSize::from_box(rect);
        let origin = (rect[0].min(rect[2]), rect[1].min(rect[3]));
        let rotation = page_rotation(doc, page_id);
        let viewed = if rotation % 180 == 90 {
            PageSize {
                width: size.height,
                height: size.width,
            }
        } else {
            size
        };

        let layout = FooterLayout::compute(viewed, spec, &self.style)?;

        let font_id = match self.font_id {
            Some(id) => id,
            None => {
                let id = StandardFont::Helvetica.add_to(doc);
                self.font_id = Some(id);
                id
            }
        };

        let content = layout.content(&self.style)?.encode()?;
        let matrix = footer_matrix(rotation, size, origin);
        let xobject_id = create_footer_xobject(doc, content, font_id, viewed, matrix);

        wrap_page_content(doc, page_id)?;
        let name = add_xobject_to_page_resources(doc, page_id, xobject_id)?;

        let mut invoke = b"q\n/".to_vec();
        invoke.extend_from_slice(&name);
        invoke.extend_from_slice(b" Do\nQ\n");
        let invoke_id = doc.add_object(Stream::new(Dictionary::new(), invoke));
        append_content_to_page(doc, page_id, invoke_id)?;

        debug!(page = spec.page_number, label = %layout.page_label.text, "stamped footer");
        Ok(())
    }
}

/// Maps footer space (origin at the bottom-left corner as displayed) to
/// page space for a page of `size` turned clockwise by `rotation` degrees
fn footer_matrix(rotation: i64, size: PageSize, origin: (f32, f32)) -> [f32; 6] {
    let (ox, oy) = origin;
    let (w, h) = (size.width, size.height);
    match rotation {
        90 => [0.0, 1.0, -1.0, 0.0, ox + w, oy],
        180 => [-1.0, 0.0, 0.0, -1.0, ox + w, oy + h],
        270 => [0.0, -1.0, 1.0, 0.0, ox, oy + h],
        _ => [1.0, 0.0, 0.0, 1.0, ox, oy],
    }
}

/// Form XObject of the displayed page size, placed by `matrix`
fn create_footer_xobject(
    doc: &mut Document,
    content: Vec<u8>,
    font_id: ObjectId,
    size: PageSize,
    matrix: [f32; 6],
) -> ObjectId {
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(size.width),
            Object::Real(size.height),
        ]),
    );
    xobject_dict.set(
        "Matrix",
        Object::Array(matrix.iter().map(|&v| Object::Real(v)).collect()),
    );
    xobject_dict.set("Resources", Object::Dictionary(resources));

    doc.add_object(Object::Stream(Stream::new(xobject_dict, content)))
}

/// Content stream references of a page, in drawing order
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    Ok(match page.get(b"Contents") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            // an indirect array of stream references
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    })
}

/// Bracket existing content in q/Q by adding two new streams around it
fn wrap_page_content(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut contents = content_refs(doc, page_id)?;
    if contents.is_empty() {
        return Ok(());
    }

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    contents.insert(0, Object::Reference(save_id));
    contents.push(Object::Reference(restore_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Append a content stream to a page's Contents
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let mut contents = content_refs(doc, page_id)?;
    contents.push(Object::Reference(new_content_id));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Register the footer XObject in the page's own Resources
///
/// Shared or indirect resource dictionaries are copied onto the page so no
/// other page sees the footer. Returns the resource name used.
fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<Vec<u8>> {
    let mut resources = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
            _ => Dictionary::new(),
        }
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let name = unique_name(&xobjects, "Footer");
    xobjects.set(name.clone(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// `base`, or `base1`, `base2`, ... if the name is taken
fn unique_name(dict: &Dictionary, base: &str) -> Vec<u8> {
    let mut candidate = base.as_bytes().to_vec();
    let mut n = 0;
    while dict.has(&candidate) {
        n += 1;
        candidate = format!("{base}{n}").into_bytes();
    }
    candidate
}
