//! PDF manipulation module

pub mod assemble;
pub mod cover;
pub mod font;
pub mod footer;
pub mod source;
pub mod writer;

// Re-export commonly used items
pub use assemble::Assembler;
pub use cover::{CoverPage, CoverPageGenerator};
pub use footer::{FooterLayout, FooterSpec, FooterStamper};
pub use source::{inspect, DocumentInfo, SourceDocument};
pub use writer::{write_document, DocumentMetadata};
