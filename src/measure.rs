//! Measurement oracle – reports the rendered height of a block.
//!
//! Pagination needs heights before any page exists, so every block (and every
//! row or item of a splittable block) is measured once up front through the
//! [`Measurer`] trait. Hosts with a live layout engine pre-annotate heights
//! and use [`AnnotatedMeasurer`]; headless callers fall back to
//! [`TextMetricsMeasurer`], a box-model estimate over font metrics.

use crate::dom::{DomNode, ElementNode, Tag};
use crate::error::{PaginationError, Result};
use crate::fonts::{FontManager, FontSpec};
use crate::split::{image, list, table::TableParts};
use crate::style::{parse_length, resolve_style, BlockStyle, Dimension, Display};

/// Typographic context a block is measured in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureConstraints {
    /// Content column width in px.
    pub width: f32,
    pub font_size: f32,
    /// Line-height factor.
    pub line_height: f32,
}

/// Reports the rendered height of an element at the given constraints.
///
/// Failures are not fatal: the allocator moves an unmeasurable block whole to
/// the next page.
pub trait Measurer {
    fn measure(&self, element: &ElementNode, constraints: &MeasureConstraints) -> Result<f32>;

    /// Height of `unit` (a table row or caption, or a list item) as laid out
    /// inside `container`. The container's own margins, padding and borders
    /// are not included.
    fn measure_in(
        &self,
        unit: &ElementNode,
        container: &ElementNode,
        constraints: &MeasureConstraints,
    ) -> Result<f32> {
        let _ = container;
        self.measure(unit, constraints)
    }
}

impl<F> Measurer for F
where
    F: Fn(&ElementNode, &MeasureConstraints) -> Result<f32>,
{
    fn measure(&self, element: &ElementNode, constraints: &MeasureConstraints) -> Result<f32> {
        self(element, constraints)
    }
}

// ---------------------------------------------------------------------------
// Annotated heights
// ---------------------------------------------------------------------------

/// Attribute a host sets to the measured `offsetHeight` of an element.
pub const HEIGHT_ATTR: &str = "data-height";

/// Reads heights a host layout engine wrote into `data-height` attributes.
pub struct AnnotatedMeasurer {
    fallback: Option<Box<dyn Measurer>>,
}

impl AnnotatedMeasurer {
    /// Annotations only; a missing annotation is a measurement failure.
    pub fn strict() -> Self {
        Self { fallback: None }
    }

    /// Annotations first, `fallback` for elements without one.
    pub fn with_fallback(fallback: impl Measurer + 'static) -> Self {
        Self {
            fallback: Some(Box::new(fallback)),
        }
    }
}

impl AnnotatedMeasurer {
    fn annotation(element: &ElementNode, constraints: &MeasureConstraints) -> Option<Result<f32>> {
        let raw = element.attr(HEIGHT_ATTR)?;
        Some(
            parse_length(raw, constraints.font_size)
                .filter(|h| h.is_finite() && *h >= 0.0)
                .ok_or_else(|| {
                    PaginationError::Measurement(format!(
                        "invalid {HEIGHT_ATTR}={raw:?} on <{}>",
                        element.tag.name()
                    ))
                }),
        )
    }

    fn missing(element: &ElementNode) -> PaginationError {
        PaginationError::Measurement(format!(
            "<{}> carries no {HEIGHT_ATTR} annotation",
            element.tag.name()
        ))
    }
}

impl Measurer for AnnotatedMeasurer {
    fn measure(&self, element: &ElementNode, constraints: &MeasureConstraints) -> Result<f32> {
        if let Some(height) = Self::annotation(element, constraints) {
            return height;
        }
        match &self.fallback {
            Some(fallback) => fallback.measure(element, constraints),
            None => Err(Self::missing(element)),
        }
    }

    fn measure_in(
        &self,
        unit: &ElementNode,
        container: &ElementNode,
        constraints: &MeasureConstraints,
    ) -> Result<f32> {
        if let Some(height) = Self::annotation(unit, constraints) {
            return height;
        }
        match &self.fallback {
            Some(fallback) => fallback.measure_in(unit, container, constraints),
            None => Err(Self::missing(unit)),
        }
    }
}

// ---------------------------------------------------------------------------
// Box-model estimate
// ---------------------------------------------------------------------------

/// Indentation a list applies to its items.
const LIST_INDENT: f32 = 24.0;

/// Estimates heights from the style resolver and font metrics: wrapped line
/// count times line height, plus margins, padding and borders.
#[derive(Default)]
pub struct TextMetricsMeasurer {
    fonts: FontManager,
}

impl TextMetricsMeasurer {
    pub fn new(fonts: FontManager) -> Self {
        Self { fonts }
    }

    fn block_height(&self, e: &ElementNode, parent: &BlockStyle, width: f32) -> Result<f32> {
        let style = resolve_style(e, parent);
        if style.display == Display::None {
            return Ok(0.0);
        }

        let inner = inner_width(&style, width);

        if e.tag == Tag::Img {
            return Ok(self.image_height(e, &style, width)? + style.margin_top + style.margin_bottom);
        }
        if let Dimension::Px(h) = style.height {
            // Border-box sizing, as in the notice stylesheet.
            return Ok(h + style.margin_top + style.margin_bottom);
        }

        let content = match e.tag {
            Tag::Br => style.line_height_px(),
            Tag::Hr => 0.0,
            Tag::Table => self.table_height(e, &style, inner)?,
            Tag::Tr => self.row_height(e, &style, inner)?,
            Tag::Ul | Tag::Ol => {
                let mut sum = 0.0;
                for item in list::list_items(e) {
                    sum += match item {
                        DomNode::Element(el) => self.block_height(el, &style, inner)?,
                        DomNode::Text(_) => self.flow_height(std::slice::from_ref(item), &style, inner)?,
                    };
                }
                sum
            }
            _ => self.flow_height(&e.children, &style, inner)?,
        };
        Ok(content + style.vertical_chrome())
    }

    /// Stack block children; wrap runs of text and inline elements into lines.
    fn flow_height(&self, children: &[DomNode], style: &BlockStyle, width: f32) -> Result<f32> {
        let mut total = 0.0;
        let mut run = String::new();
        for child in children {
            match child {
                DomNode::Element(el) if !el.tag.is_inline() => {
                    total += self.text_height(&run, style, width);
                    run.clear();
                    total += self.block_height(el, style, width)?;
                }
                _ => collect_inline(child, &mut run),
            }
        }
        total += self.text_height(&run, style, width);
        Ok(total)
    }

    fn text_height(&self, run: &str, style: &BlockStyle, width: f32) -> f32 {
        if run.chars().all(|c| c == ' ') {
            return 0.0;
        }
        let text = run.trim_matches(' ');
        let text = text.strip_suffix('\n').unwrap_or(text);
        let spec = FontSpec {
            family: &style.font_family,
            bold: style.is_bold(),
            italic: style.is_italic(),
        };
        let lines = self.fonts.wrap_lines(text, &spec, style.font_size, width);
        lines.len() as f32 * style.line_height_px()
    }

    fn table_height(&self, table: &ElementNode, style: &BlockStyle, width: f32) -> Result<f32> {
        let parts = TableParts::decompose(table);
        let mut total = 0.0;
        for node in &parts.leading {
            if let DomNode::Element(caption) = node {
                total += self.block_height(caption, style, width)?;
            }
        }
        for row in parts.header.iter().chain(&parts.body).chain(&parts.footer) {
            total += self.row_height(row, style, width)?;
        }
        Ok(total)
    }

    /// Tallest cell of a row, with columns sharing the width equally.
    fn row_height(&self, row: &ElementNode, style: &BlockStyle, width: f32) -> Result<f32> {
        let row_style = resolve_style(row, style);
        let span = |cell: &ElementNode| {
            cell.attr("colspan")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .max(1)
        };
        let columns: usize = row.element_children().map(span).sum::<usize>().max(1);
        let column_width = width / columns as f32;

        let mut tallest: f32 = 0.0;
        for cell in row.element_children() {
            let h = self.block_height(cell, &row_style, column_width * span(cell) as f32)?;
            tallest = tallest.max(h);
        }
        Ok(tallest)
    }

    /// Declared size, else natural size clamped to the column width.
    fn image_height(&self, img: &ElementNode, style: &BlockStyle, width: f32) -> Result<f32> {
        let (declared_w, declared_h) = image::declared_size(img);
        let declared_h = match style.height {
            Dimension::Px(h) => Some(h),
            _ => declared_h,
        };
        let natural = image::natural_size(img);

        let height = match (declared_w, declared_h, natural) {
            (_, Some(h), _) => h,
            (Some(w), None, Some((nw, nh))) => w * nh / nw,
            (None, None, Some((nw, nh))) if nw > width => width * nh / nw,
            (None, None, Some((_, nh))) => nh,
            _ => {
                return Err(PaginationError::Measurement(format!(
                    "image {:?} has no declared or decodable size",
                    img.src().unwrap_or("")
                )))
            }
        };
        Ok(height)
    }
}

/// Content-box width of a block laid out in `width`.
fn inner_width(style: &BlockStyle, width: f32) -> f32 {
    let inner = style
        .width
        .resolve(width)
        .unwrap_or(width - style.margin_left - style.margin_right)
        - style.padding_left
        - style.padding_right
        - 2.0 * style.border_width;
    inner.max(1.0)
}

/// Append the text of an inline subtree with source whitespace collapsed to
/// spaces; only `<br>` produces a line break.
fn collect_inline(node: &DomNode, run: &mut String) {
    match node {
        DomNode::Text(t) => run.extend(t.chars().map(|c| {
            if c.is_whitespace() && c != '\u{00A0}' {
                ' '
            } else {
                c
            }
        })),
        DomNode::Element(e) if e.tag == Tag::Br => run.push('\n'),
        DomNode::Element(e) => {
            for child in &e.children {
                collect_inline(child, run);
            }
        }
    }
}

impl Measurer for TextMetricsMeasurer {
    fn measure(&self, element: &ElementNode, constraints: &MeasureConstraints) -> Result<f32> {
        let root = BlockStyle::root(constraints.font_size, constraints.line_height);
        let width = if element.tag == Tag::Li {
            constraints.width - LIST_INDENT
        } else {
            constraints.width
        };
        self.block_height(element, &root, width)
    }

    fn measure_in(
        &self,
        unit: &ElementNode,
        container: &ElementNode,
        constraints: &MeasureConstraints,
    ) -> Result<f32> {
        let root = BlockStyle::root(constraints.font_size, constraints.line_height);
        let style = resolve_style(container, &root);
        let inner = inner_width(&style, constraints.width);
        match (&container.tag, &unit.tag) {
            (Tag::Table, Tag::Tr) => self.row_height(unit, &style, inner),
            _ => self.block_height(unit, &style, inner),
        }
    }
}
