//! Serialising the merged document
//!
//! The file is written next to its destination under a temporary name and
//! renamed into place, so a failed write never leaves a partial PDF behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Offset, TimeZone};
use lopdf::{Dictionary, Document, Object, StringFormat};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Info dictionary entries written with the output
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    /// Stored only when non-empty
    pub title: String,
    pub producer: String,
}

/// Set the Info dictionary, compress and save `doc` to `path`
///
/// An existing file at `path` is replaced.
pub fn write_document(doc: &mut Document, path: &Path, metadata: &DocumentMetadata) -> Result<u64> {
    set_info(doc, metadata, &Local::now());
    doc.compress();

    let temp_path = temp_path_for(path);
    debug!(temp = %temp_path.display(), "writing temporary output");

    let written = save_to_file(doc, &temp_path).and_then(|size| {
        fs::rename(&temp_path, path).map(|_| size)
    });

    match written {
        Ok(size) => {
            info!(path = %path.display(), bytes = size, "wrote merged PDF");
            Ok(size)
        }
        Err(source) => {
            let _ = fs::remove_file(&temp_path);
            Err(Error::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn save_to_file(doc: &mut Document, path: &Path) -> std::io::Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    doc.save_to(&mut writer).map_err(std::io::Error::other)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

/// Hidden sibling of `path` carrying the process id
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn set_info<Tz: TimeZone>(doc: &mut Document, metadata: &DocumentMetadata, now: &DateTime<Tz>) {
    let mut info = Dictionary::new();
    if !metadata.title.is_empty() {
        info.set("Title", text_string(&metadata.title));
    }
    if !metadata.producer.is_empty() {
        info.set("Producer", text_string(&metadata.producer));
    }
    info.set(
        "CreationDate",
        Object::String(pdf_date(now).into_bytes(), StringFormat::Literal),
    );
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// `D:YYYYMMDDHHmmSS+HH'mm'`
fn pdf_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let offset = now.offset().fix().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{}{:02}'{:02}'",
        now.naive_local().format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}
