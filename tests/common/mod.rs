//! Fixture PDFs built in-process, plus readers for merged output

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

pub const LETTER: [f32; 2] = [612.0, 792.0];
pub const A4: [f32; 2] = [595.28, 841.89];

/// Write a PDF whose pages each show one line of text
///
/// The MediaBox lives on the Pages node, so pages inherit it.
pub fn write_pdf(dir: &Path, name: &str, texts: &[&str], size: [f32; 2]) -> PathBuf {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for text in texts {
        let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => texts.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(size[0]), Object::Real(size[1])],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("failed to write fixture");
    path
}

/// Letter-sized PDF with pages labelled `<stem> p1`, `<stem> p2`, ...
pub fn write_numbered_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let stem = name.trim_end_matches(".pdf");
    let texts: Vec<String> = (1..=pages).map(|i| format!("{stem} p{i}")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    write_pdf(dir, name, &refs, LETTER)
}

/// Load a merged output with all streams decompressed
pub fn load_output(path: &Path) -> Document {
    let mut doc = Document::load(path).expect("output should load");
    doc.decompress();
    doc
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn shown_bytes(content: &[u8]) -> Vec<Vec<u8>> {
    let content = Content::decode(content).expect("content should decode");
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| op.operands.first()?.as_str().ok())
        .map(|bytes| bytes.to_vec())
        .collect()
}

fn shown_strings(content: &[u8]) -> Vec<String> {
    shown_bytes(content)
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .collect()
}

/// Strings drawn directly by the page's content streams
pub fn page_text(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let content = doc.get_page_content(page_id).expect("page content");
    shown_strings(&content)
}

/// Footer XObject streams registered on the page
fn footer_streams(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let page = doc.get_dictionary(page_id).expect("page dictionary");
    let resources = match page.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => dict,
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).expect("resources"),
        _ => return Vec::new(),
    };
    let xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(dict)) => dict,
        _ => return Vec::new(),
    };

    xobjects
        .iter()
        .filter(|(name, _)| name.starts_with(b"Footer"))
        .map(|(_, value)| {
            let id = value.as_reference().expect("footer reference");
            doc.get_object(id).and_then(Object::as_stream).expect("footer stream")
        })
        .collect()
}

/// Raw WinAnsi strings drawn by the footer
pub fn footer_bytes(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
    footer_streams(doc, page_id)
        .into_iter()
        .flat_map(|stream| shown_bytes(&stream.content))
        .collect()
}

/// Strings drawn by the footer XObjects registered on the page
pub fn footer_text(doc: &Document, page_id: ObjectId) -> Vec<String> {
    footer_streams(doc, page_id)
        .into_iter()
        .flat_map(|stream| shown_strings(&stream.content))
        .collect()
}

/// Matrix of the page's footer XObject
pub fn footer_matrix(doc: &Document, page_id: ObjectId) -> Vec<f32> {
    let streams = footer_streams(doc, page_id);
    let stream = streams.first().expect("page has a footer");
    stream
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .expect("Matrix")
        .iter()
        .map(|v| v.as_float().expect("number"))
        .collect()
}

/// Set `/Rotate` on every page of a fixture file
pub fn set_rotation(path: &Path, degrees: i64) {
    let mut doc = Document::load(path).expect("fixture should load");
    for page_id in page_ids(&doc) {
        doc.get_dictionary_mut(page_id)
            .expect("page dictionary")
            .set("Rotate", Object::Integer(degrees));
    }
    doc.save(path).expect("failed to rewrite fixture");
}

/// MediaBox of a page as stored on the page itself
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let page = doc.get_dictionary(page_id).expect("page dictionary");
    let values: Vec<f32> = page
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("MediaBox")
        .iter()
        .map(|v| v.as_float().expect("number"))
        .collect();
    [values[0], values[1], values[2], values[3]]
}
