//! Input documents: loading, validation and page-tree access

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::layout::PageSize;
use crate::plan::SourceRef;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 32;

/// A loaded input PDF
///
/// Owns its lopdf document; nothing is shared between merges.
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    role: SourceRef,
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Load and validate a PDF
    pub fn open(path: &Path, role: SourceRef) -> Result<Self> {
        if !path.exists() {
            return Err(Error::unreadable(path, "file not found"));
        }
        if !path.is_file() {
            return Err(Error::unreadable(path, "not a regular file"));
        }

        let doc = Document::load(path).map_err(|e| Error::unreadable(path, e.to_string()))?;
        check_not_encrypted(&doc).map_err(|reason| Error::unreadable(path, reason))?;
        doc.catalog()
            .map_err(|e| Error::unreadable(path, format!("missing document catalog: {e}")))?;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        info!(path = %path.display(), pages = page_ids.len(), "loaded PDF");

        Ok(Self {
            path: path.to_path_buf(),
            role,
            doc,
            page_ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn role(&self) -> SourceRef {
        self.role
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Cover label for this document: the file name without extension
    pub fn label(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// MediaBox size of the first page, if there is one
    pub fn first_page_size(&self) -> Option<PageSize> {
        let page_id = *self.page_ids.first()?;
        media_box(&self.doc, page_id).map(PageSize::from_box)
    }

    /// Copy inherited attributes onto every page dictionary
    ///
    /// Pages are re-parented during the merge, so anything they pick up from
    /// their old `Pages` ancestors has to live on the page itself.
    pub fn flatten_inherited_attributes(&mut self) -> Result<()> {
        for &page_id in &self.page_ids {
            let mut inherited: Vec<(&[u8], Object)> = Vec::new();
            {
                let page = self.doc.get_dictionary(page_id)?;
                for key in INHERITABLE {
                    if page.has(key) {
                        continue;
                    }
                    if let Some(value) = find_inherited(&self.doc, page, key) {
                        inherited.push((key, value));
                    }
                }
            }

            if inherited.is_empty() {
                continue;
            }
            debug!(?page_id, count = inherited.len(), "flattening inherited page attributes");
            let page = self.doc.get_dictionary_mut(page_id)?;
            for (key, value) in inherited {
                page.set(key.to_vec(), value);
            }
        }
        Ok(())
    }

    /// Hand the lopdf document over to the assembler
    pub fn into_parts(self) -> (Document, Vec<ObjectId>) {
        (self.doc, self.page_ids)
    }
}

/// Reject documents that still carry an encryption dictionary after loading
pub fn check_not_encrypted(doc: &Document) -> std::result::Result<(), String> {
    if doc.trailer.has(b"Encrypt") {
        Err("document is encrypted".to_string())
    } else {
        Ok(())
    }
}

/// Look up `key` on the ancestors of `page`
fn find_inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut current = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = match current.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        let parent = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        current = parent;
    }
    None
}

/// Resolve a page's MediaBox, walking up the page tree when needed
pub fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let page = doc.get_dictionary(page_id).ok()?;
    let value = match page.get(b"MediaBox") {
        Ok(value) => value.clone(),
        Err(_) => find_inherited(doc, page, b"MediaBox")?,
    };
    rect_from_object(doc, &value)
}

/// Page `/Rotate` as 0, 90, 180 or 270; values off the quarter turns count as 0
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return 0;
    };
    let value = match page.get(b"Rotate") {
        Ok(value) => Some(value.clone()),
        Err(_) => find_inherited(doc, page, b"Rotate"),
    };
    match value.and_then(|v| v.as_i64().ok()) {
        Some(degrees) if degrees % 90 == 0 => degrees.rem_euclid(360),
        _ => 0,
    }
}

/// Parse a `[a b c d]` rectangle, resolving an indirect array
pub fn rect_from_object(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let arr = match obj {
        Object::Array(arr) => arr,
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr,
            _ => return None,
        },
        _ => return None,
    };
    if arr.len() != 4 {
        return None;
    }

    let values: Vec<f32> = arr
        .iter()
        .filter_map(|o| match o {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            _ => None,
        })
        .collect();

    match values.as_slice() {
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

/// Summary of a PDF for the `info` command
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub first_page_size: Option<PageSize>,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Read page count, size and Info metadata of a PDF
pub fn inspect(path: &Path) -> Result<DocumentInfo> {
    let source = SourceDocument::open(path, SourceRef::Main)?;
    let doc = source.document();

    let info_dict = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let text_entry = |key: &[u8]| -> Option<String> {
        let bytes = info_dict?.get(key).ok()?.as_str().ok()?;
        Some(decode_text_string(bytes))
    };

    Ok(DocumentInfo {
        page_count: source.page_count(),
        first_page_size: source.first_page_size(),
        title: text_entry(b"Title"),
        author: text_entry(b"Author"),
    })
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise Latin-1)
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
