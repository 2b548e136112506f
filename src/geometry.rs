//! Geometry model – page size, margins and header/footer bands.
//!
//! All values are CSS pixels at 96 DPI, the unit the editor preview and the
//! box-model measurer share. The only derived quantity the allocator needs is
//! the vertical content budget of a page, which differs between the first page
//! (full letterhead) and continuation pages (condensed header band).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PaginationError, Result};
use crate::measure::MeasureConstraints;

/// A4 width at 96 DPI.
pub const A4_WIDTH_PX: f32 = 794.0;
/// A4 height at 96 DPI.
pub const A4_HEIGHT_PX: f32 = 1123.0;

/// Which header band a page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    /// Page 1: full letterhead (reference, address block, title).
    First,
    /// Pages 2+: condensed header band.
    Continuation,
}

impl PageClass {
    /// Page class of a 1-based page number.
    pub fn for_page(page_number: usize) -> Self {
        if page_number <= 1 {
            PageClass::First
        } else {
            PageClass::Continuation
        }
    }
}

impl fmt::Display for PageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageClass::First => f.write_str("first"),
            PageClass::Continuation => f.write_str("continuation"),
        }
    }
}

/// Physical page layout supplied once per pagination call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Outer page width.
    pub page_width: f32,
    /// Outer page height.
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Header band reserved on page 1. Zero when headers are disabled.
    pub first_page_header_height: f32,
    /// Header band reserved on pages 2+. Zero when headers are disabled.
    pub continuation_header_height: f32,
    /// Footer band reserved on every page.
    pub footer_height: f32,
    /// Base font size handed to the measurer.
    pub font_size: f32,
    /// Line-height factor (multiple of `font_size`).
    pub line_height: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::a4_notice()
    }
}

impl Geometry {
    /// A4 print layout of an official notice: 14.8 mm margins, a 200 px
    /// letterhead on the first page and an 80 px continuation band.
    pub fn a4_notice() -> Self {
        Self {
            page_width: A4_WIDTH_PX,
            page_height: A4_HEIGHT_PX,
            margin_top: 56.0,
            margin_bottom: 56.0,
            margin_left: 56.0,
            margin_right: 56.0,
            first_page_header_height: 200.0,
            continuation_header_height: 80.0,
            footer_height: 60.0,
            font_size: 12.0,
            line_height: 1.6,
        }
    }

    /// A4 on-screen preview: one-inch margins, a compact 80 px header on the
    /// first page only and a 40 px footer.
    pub fn a4_preview() -> Self {
        Self {
            margin_top: 96.0,
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
            first_page_header_height: 80.0,
            continuation_header_height: 0.0,
            footer_height: 40.0,
            ..Self::a4_notice()
        }
    }

    /// Same geometry with both header bands removed.
    pub fn without_headers(mut self) -> Self {
        self.first_page_header_height = 0.0;
        self.continuation_header_height = 0.0;
        self
    }

    /// Header band height for a page class.
    pub fn header_height(&self, class: PageClass) -> f32 {
        match class {
            PageClass::First => self.first_page_header_height,
            PageClass::Continuation => self.continuation_header_height,
        }
    }

    /// Width of the content column between the side margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Vertical content budget of a page of the given class.
    ///
    /// Fails with [`PaginationError::Configuration`] when the bands and
    /// margins leave no positive room, since allocation could never make
    /// progress on such a page.
    pub fn available_height(&self, class: PageClass) -> Result<f32> {
        self.check_inputs()?;
        let available = self.page_height
            - self.margin_top
            - self.margin_bottom
            - self.header_height(class)
            - self.footer_height;
        if available > 0.0 {
            Ok(available)
        } else {
            Err(PaginationError::Configuration { class, available })
        }
    }

    /// Validate every page class up front.
    pub fn validate(&self) -> Result<()> {
        self.available_height(PageClass::First)?;
        self.available_height(PageClass::Continuation)?;
        if self.content_width() <= 0.0 {
            return Err(PaginationError::InvalidGeometry(format!(
                "side margins leave {}px of content width",
                self.content_width()
            )));
        }
        Ok(())
    }

    /// Typographic context handed to the measurer.
    pub fn constraints(&self) -> MeasureConstraints {
        MeasureConstraints {
            width: self.content_width(),
            font_size: self.font_size,
            line_height: self.line_height,
        }
    }

    fn check_inputs(&self) -> Result<()> {
        let fields = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("first_page_header_height", self.first_page_header_height),
            ("continuation_header_height", self.continuation_header_height),
            ("footer_height", self.footer_height),
            ("font_size", self.font_size),
            ("line_height", self.line_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PaginationError::InvalidGeometry(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
