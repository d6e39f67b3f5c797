//! Page geometry and the default footer / cover styles
//!
//! All PDF coordinates are in points (1/72 inch) with the origin at the
//! bottom-left corner of the MediaBox.

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f32 {
        (self.0 * 72.0 / 25.4) as f32
    }
}

/// Page size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_inches(8.5).pt(),
            height: Length::from_inches(11.0).pt(),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0).pt(),
            height: Length::from_mm(297.0).pt(),
        }
    }

    /// Size of a `[llx lly urx ury]` box; corners may be given in any order
    pub fn from_box(rect: [f32; 4]) -> Self {
        Self {
            width: (rect[2] - rect[0]).abs(),
            height: (rect[3] - rect[1]).abs(),
        }
    }
}

/// Fixed paper size used for cover pages when the main document has no pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperSize {
    #[default]
    Letter,
    A4,
}

impl PaperSize {
    pub fn size(self) -> PageSize {
        match self {
            PaperSize::Letter => PageSize::letter(),
            PaperSize::A4 => PageSize::a4(),
        }
    }
}

/// Footer appearance; positions are measured from the MediaBox origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FooterStyle {
    /// Helvetica size for title and page number
    pub font_size: f32,
    /// Left and right inset of text and rule
    pub margin: f32,
    /// Text baseline height above the bottom edge
    pub baseline_y: f32,
    /// Height of the horizontal rule above the bottom edge
    pub rule_y: f32,
    /// Gray level of the rule (0 = black, 1 = white)
    pub rule_gray: f32,
    /// Rule stroke width
    pub rule_width: f32,
    /// Minimum page height able to carry the footer
    pub band_height: f32,
    /// Space kept between the title and the page number
    pub gap: f32,
}

impl Default for FooterStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            margin: Length::from_inches(0.5).pt(),
            baseline_y: Length::from_inches(0.25).pt(),
            rule_y: Length::from_inches(0.5).pt(),
            rule_gray: 0.5,
            rule_width: 0.75,
            band_height: Length::from_inches(0.7).pt(),
            gap: 12.0,
        }
    }
}

/// Cover page label appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverStyle {
    /// Helvetica-Bold size for the label
    pub font_size: f32,
}

impl Default for CoverStyle {
    fn default() -> Self {
        Self { font_size: 24.0 }
    }
}
