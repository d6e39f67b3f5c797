//! Building the output document from several loaded sources
//!
//! Object ids of every source are shifted into a disjoint range so all
//! objects can live in one lopdf document. The final page tree is flat:
//! one `Pages` node whose kids are the pages in merge-plan order.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::source::SourceDocument;

/// Output document under construction
#[derive(Debug)]
pub struct Assembler {
    doc: Document,
    next_id: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            next_id: 1,
        }
    }

    /// Move all objects of `source` into the output document
    ///
    /// Returns the source's page ids, in page order, as they are numbered in
    /// the output document. The pages are not yet part of any page tree.
    pub fn import(&mut self, mut source: SourceDocument) -> Result<Vec<ObjectId>> {
        source.flatten_inherited_attributes()?;
        let path = source.path().to_path_buf();
        let expected = source.page_count();
        let (mut doc, _) = source.into_parts();

        doc.renumber_objects_with(self.next_id);
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.len() != expected {
            return Err(Error::unreadable(
                path,
                format!("page tree changed while importing ({expected} -> {})", page_ids.len()),
            ));
        }

        if doc.version > self.doc.version {
            self.doc.version = doc.version.clone();
        }

        debug!(
            path = %path.display(),
            first_id = self.next_id,
            last_id = doc.max_id,
            "imported objects"
        );
        self.next_id = self.next_id.max(doc.max_id + 1);
        self.doc.objects.extend(doc.objects);
        self.doc.max_id = self.next_id - 1;

        Ok(page_ids)
    }

    /// Output document, for adding cover pages and footers
    pub fn document_mut(&mut self) -> &mut Document {
        self.doc.max_id = self.doc.max_id.max(self.next_id - 1);
        &mut self.doc
    }

    /// Build the page tree from `pages` and drop everything unreachable
    pub fn finish(mut self, pages: &[ObjectId]) -> Result<Document> {
        self.doc.max_id = self.doc.max_id.max(self.next_id - 1);
        let pages_id = self.doc.new_object_id();

        for &page_id in pages {
            self.doc
                .get_dictionary_mut(page_id)?
                .set("Parent", Object::Reference(pages_id));
        }

        let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(pages.len() as i64));
        pages_object.set("Kids", Object::Array(kids));
        self.doc.objects.insert(pages_id, Object::Dictionary(pages_object));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));

        self.doc.trailer = Dictionary::new();
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        // old catalogs, page trees and outlines of the sources
        let pruned = self.doc.prune_objects();
        debug!(pruned = pruned.len(), "dropped unreachable source objects");

        Ok(self.doc)
    }
}
