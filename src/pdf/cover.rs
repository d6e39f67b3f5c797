//! Cover pages placed before each trial document

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::layout::{CoverStyle, PageSize};
use crate::pdf::font::{encode_win_ansi, StandardFont};

/// A synthesized page, not yet attached to a page tree
#[derive(Debug, Clone, PartialEq)]
pub struct CoverPage {
    pub page_id: ObjectId,
    pub label: String,
    pub size: PageSize,
}

/// Builds cover pages inside the output document
///
/// The bold font object is created on first use and shared by every cover.
#[derive(Debug)]
pub struct CoverPageGenerator {
    size: PageSize,
    style: CoverStyle,
    font_id: Option<ObjectId>,
}

impl CoverPageGenerator {
    pub fn new(size: PageSize, style: CoverStyle) -> Self {
        Self {
            size,
            style,
            font_id: None,
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    /// Add a page showing `label` centred at mid-height
    ///
    /// Fails without touching `doc` when the label has a character
    /// Helvetica-Bold cannot show.
    pub fn generate(&mut self, doc: &mut Document, label: &str) -> Result<CoverPage> {
        let content = cover_content(label, self.size, &self.style)?.encode()?;

        let font_id = match self.font_id {
            Some(id) => id,
            None => {
                let id = StandardFont::HelveticaBold.add_to(doc);
                self.font_id = Some(id);
                id
            }
        };

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.size.width),
                Object::Real(self.size.height),
            ]),
        );
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));

        let page_id = doc.add_object(Object::Dictionary(page));

        Ok(CoverPage {
            page_id,
            label: label.to_string(),
            size: self.size,
        })
    }
}

fn cover_content(label: &str, size: PageSize, style: &CoverStyle) -> Result<Content> {
    let text = encode_win_ansi(label).map_err(|c| {
        Error::InvalidRequest(format!(
            "cover label {label:?} contains {c:?}, which Helvetica-Bold cannot show"
        ))
    })?;
    let width = StandardFont::HelveticaBold.text_width(label, style.font_size);
    let x = ((size.width - width) / 2.0).max(0.0);
    let y = size.height / 2.0;

    Ok(Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("g", vec![0.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Real(style.font_size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(text, lopdf::StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    })
}
