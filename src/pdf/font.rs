//! Standard Type1 fonts (Helvetica, Helvetica-Bold) and text measurement
//!
//! The standard 14 fonts need no embedding; widths come from the Adobe AFM
//! metrics so right-aligned and centred text lands where expected.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// One of the two faces we draw with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

/// Helvetica widths for chars 32-126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

/// Helvetica-Bold widths for chars 32-126, in 1/1000 em
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48-63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80-95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96-111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112-126
];

/// Helvetica widths for bytes 0x80-0xFF; 0 where WinAnsi has no glyph
const HELVETICA_HIGH_WIDTHS: [u16; 128] = [
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

/// Helvetica-Bold widths for bytes 0x80-0xFF; 0 where WinAnsi has no glyph
const HELVETICA_BOLD_HIGH_WIDTHS: [u16; 128] = [
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0, // 0x80
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667, // 0x90
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // 0xF0
];

/// Unicode characters at WinAnsi bytes 0x80-0x9F, where it departs from Latin-1
const WIN_ANSI_0X80: [Option<char>; 32] = [
    Some('\u{20AC}'), // Euro
    None,
    Some('\u{201A}'), // quotesinglbase
    Some('\u{0192}'), // florin
    Some('\u{201E}'), // quotedblbase
    Some('\u{2026}'), // ellipsis
    Some('\u{2020}'), // dagger
    Some('\u{2021}'), // daggerdbl
    Some('\u{02C6}'), // circumflex
    Some('\u{2030}'), // perthousand
    Some('\u{0160}'), // Scaron
    Some('\u{2039}'), // guilsinglleft
    Some('\u{0152}'), // OE
    None,
    Some('\u{017D}'), // Zcaron
    None,
    None,
    Some('\u{2018}'), // quoteleft
    Some('\u{2019}'), // quoteright
    Some('\u{201C}'), // quotedblleft
    Some('\u{201D}'), // quotedblright
    Some('\u{2022}'), // bullet
    Some('\u{2013}'), // endash
    Some('\u{2014}'), // emdash
    Some('\u{02DC}'), // tilde
    Some('\u{2122}'), // trademark
    Some('\u{0161}'), // scaron
    Some('\u{203A}'), // guilsinglright
    Some('\u{0153}'), // oe
    None,
    Some('\u{017E}'), // zcaron
    Some('\u{0178}'), // Ydieresis
];

/// Assumed for characters with no WinAnsi code; such text is rejected before drawing
const FALLBACK_WIDTH: u16 = 556;

impl StandardFont {
    pub fn base_font(self) -> &'static [u8] {
        match self {
            StandardFont::Helvetica => b"Helvetica",
            StandardFont::HelveticaBold => b"Helvetica-Bold",
        }
    }

    fn glyph_width(self, byte: u8) -> u16 {
        let (ascii, high) = match self {
            StandardFont::Helvetica => (&HELVETICA_WIDTHS, &HELVETICA_HIGH_WIDTHS),
            StandardFont::HelveticaBold => (&HELVETICA_BOLD_WIDTHS, &HELVETICA_BOLD_HIGH_WIDTHS),
        };
        match byte {
            32..=126 => ascii[(byte - 32) as usize],
            0x80..=0xFF => high[(byte - 0x80) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in points when set at `font_size`
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| win_ansi_byte(c).map_or(FALLBACK_WIDTH, |b| self.glyph_width(b)))
            .map(u32::from)
            .sum();
        units as f32 * font_size / 1000.0
    }

    /// Add the font dictionary to `doc`
    pub fn add_to(self, doc: &mut Document) -> ObjectId {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(self.base_font().to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        doc.add_object(Object::Dictionary(font))
    }
}

/// WinAnsiEncoding code of `c`, if the encoding has a glyph for it
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => Some(c as u8),
        _ => WIN_ANSI_0X80
            .iter()
            .position(|&mapped| mapped == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

/// Encode text as single-byte WinAnsi
///
/// Fails with the first character that has no WinAnsi glyph.
pub fn encode_win_ansi(text: &str) -> std::result::Result<Vec<u8>, char> {
    text.chars().map(|c| win_ansi_byte(c).ok_or(c)).collect()
}
