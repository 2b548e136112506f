//! Content model – the immutable block arena the allocator works over.
//!
//! The editor body is cut into top-level blocks, each measured once (and, for
//! tables and lists, once per row or item). Pagination never clones or
//! mutates these nodes: it records placements as [`Fragment`]s, which are
//! plain indices into the arena plus a row/item range. Markup is only
//! rebuilt when a page is assembled.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::dom::{DomNode, ElementNode, Tag};
use crate::measure::{MeasureConstraints, Measurer};
use crate::split::{image, list, table};
use crate::style::{resolve_style, BlockStyle};

/// Structural kind of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    Table,
    List,
    Image,
    Other,
}

impl BlockKind {
    /// Classify a top-level element.
    pub fn classify(element: &ElementNode) -> Self {
        match &element.tag {
            t if t.is_heading() => BlockKind::Heading,
            Tag::Table => BlockKind::Table,
            Tag::Ul | Tag::Ol => BlockKind::List,
            Tag::Img => BlockKind::Image,
            Tag::P | Tag::Div | Tag::Figure | Tag::Anonymous
                if image::find_image(element).is_some() =>
            {
                BlockKind::Image
            }
            Tag::P | Tag::Div | Tag::Anonymous => BlockKind::Paragraph,
            _ => BlockKind::Other,
        }
    }

    /// Tables and lists have sub-units that can be distributed over pages.
    pub fn is_splittable(self) -> bool {
        matches!(self, BlockKind::Table | BlockKind::List)
    }
}

/// Measured sub-units of a splittable block.
#[derive(Debug, Clone, PartialEq)]
pub enum SubUnits {
    /// Atomic, or sub-unit measurement was unavailable.
    None,
    /// Table rows. `header` and `footer` are the summed heights of the
    /// header and footer row groups (zero when absent). `chrome` is the
    /// table's own margins, padding and borders, carried by every part;
    /// `caption` is carried only by the part that starts at row 0.
    Rows {
        header: f32,
        rows: Vec<f32>,
        footer: f32,
        has_header: bool,
        has_footer: bool,
        chrome: f32,
        caption: f32,
    },
    /// List items. `chrome` is the list's own margins and padding.
    Items { items: Vec<f32>, chrome: f32 },
}

/// A measured top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub kind: BlockKind,
    /// The block's markup. Never mutated.
    pub element: ElementNode,
    /// Rendered height; `None` when the measurer could not report one.
    pub height: Option<f32>,
    pub units: SubUnits,
    /// Forced page break before this block.
    pub break_before: bool,
    /// Forced page break after this block.
    pub break_after: bool,
    /// `page-break-inside: avoid` – keep a table or list in one piece.
    pub avoid_split: bool,
}

impl ContentNode {
    /// A block with a known height and no sub-units.
    pub fn new(kind: BlockKind, element: ElementNode, height: f32) -> Self {
        Self {
            kind,
            element,
            height: Some(height),
            units: SubUnits::None,
            break_before: false,
            break_after: false,
            avoid_split: false,
        }
    }

    /// Classify and measure an element, including its rows or items.
    pub fn measure(
        element: ElementNode,
        measurer: &dyn Measurer,
        constraints: &MeasureConstraints,
    ) -> Self {
        let kind = BlockKind::classify(&element);
        let style = resolve_style(
            &element,
            &BlockStyle::root(constraints.font_size, constraints.line_height),
        );

        let height = match measurer.measure(&element, constraints) {
            Ok(h) if h.is_finite() && h >= 0.0 => Some(h),
            Ok(h) => {
                log::warn!("Measurer returned unusable height {h} for <{}>", element.tag.name());
                None
            }
            Err(e) => {
                log::warn!("Could not measure <{}>: {e}", element.tag.name());
                None
            }
        };

        let units = match kind {
            BlockKind::Table => measure_table_units(&element, height, measurer, constraints),
            BlockKind::List => measure_list_units(&element, height, measurer, constraints),
            _ => SubUnits::None,
        };

        Self {
            kind,
            element,
            height,
            units,
            break_before: style.page_break_before,
            break_after: style.page_break_after,
            avoid_split: style.page_break_inside_avoid,
        }
    }

    /// Attach table row metrics. Whatever part of the block height the
    /// rows do not account for becomes chrome.
    pub fn with_rows(mut self, header: Option<f32>, rows: Vec<f32>, footer: Option<f32>) -> Self {
        let (header_h, footer_h) = (header.unwrap_or(0.0), footer.unwrap_or(0.0));
        let chrome = leftover(self.height, header_h + rows.iter().sum::<f32>() + footer_h);
        self.units = SubUnits::Rows {
            header: header_h,
            rows,
            footer: footer_h,
            has_header: header.is_some(),
            has_footer: footer.is_some(),
            chrome,
            caption: 0.0,
        };
        self
    }

    /// Attach list item metrics.
    pub fn with_items(mut self, items: Vec<f32>) -> Self {
        let chrome = leftover(self.height, items.iter().sum());
        self.units = SubUnits::Items { items, chrome };
        self
    }

    /// Whether the allocator may distribute this block over several pages.
    pub fn splittable(&self) -> bool {
        self.kind.is_splittable() && !self.avoid_split && !matches!(self.units, SubUnits::None)
    }

    /// Smallest height that must fit for any of this block to start on a
    /// page: chrome, caption, header group and first row for tables, chrome
    /// and first item for lists, the whole block otherwise.
    pub fn leading_height(&self) -> Option<f32> {
        if self.splittable() {
            match &self.units {
                SubUnits::Rows {
                    header,
                    rows,
                    chrome,
                    caption,
                    ..
                } => return rows.first().map(|r| chrome + caption + header + r).or(self.height),
                SubUnits::Items { items, chrome } => {
                    return items.first().map(|i| chrome + i).or(self.height)
                }
                SubUnits::None => {}
            }
        }
        self.height
    }

    /// Number of rows or items, if the block has sub-units.
    pub fn unit_count(&self) -> Option<usize> {
        match &self.units {
            SubUnits::Rows { rows, .. } => Some(rows.len()),
            SubUnits::Items { items, .. } => Some(items.len()),
            SubUnits::None => None,
        }
    }
}

/// Height of a block not covered by its sub-units.
fn leftover(height: Option<f32>, units: f32) -> f32 {
    height.map_or(0.0, |h| (h - units).max(0.0))
}

fn measure_table_units(
    element: &ElementNode,
    height: Option<f32>,
    measurer: &dyn Measurer,
    constraints: &MeasureConstraints,
) -> SubUnits {
    let parts = table::TableParts::decompose(element);
    let measure_all = |rows: &[&ElementNode]| -> Option<Vec<f32>> {
        rows.iter()
            .map(|row| measurer.measure_in(row, element, constraints).ok())
            .collect()
    };
    let caption: Option<f32> = parts
        .leading
        .iter()
        .filter_map(|node| node.as_element())
        .map(|caption| measurer.measure_in(caption, element, constraints).ok())
        .sum();
    let (Some(header), Some(rows), Some(footer), Some(caption)) = (
        measure_all(&parts.header),
        measure_all(&parts.body),
        measure_all(&parts.footer),
        caption,
    ) else {
        log::warn!("Table rows could not be measured; the table will be kept whole");
        return SubUnits::None;
    };
    let header_h: f32 = header.iter().sum();
    let footer_h: f32 = footer.iter().sum();
    let chrome = leftover(height, header_h + rows.iter().sum::<f32>() + footer_h + caption);
    SubUnits::Rows {
        has_header: !header.is_empty(),
        has_footer: !footer.is_empty(),
        header: header_h,
        rows,
        footer: footer_h,
        chrome,
        caption,
    }
}

fn measure_list_units(
    element: &ElementNode,
    height: Option<f32>,
    measurer: &dyn Measurer,
    constraints: &MeasureConstraints,
) -> SubUnits {
    let items: Option<Vec<f32>> = list::list_items(element)
        .into_iter()
        .map(|item| match item {
            DomNode::Element(e) => measurer.measure_in(e, element, constraints).ok(),
            DomNode::Text(_) => {
                let mut anon = ElementNode::new(Tag::Anonymous);
                anon.children.push(item.clone());
                measurer.measure_in(&anon, element, constraints).ok()
            }
        })
        .collect();
    match items {
        Some(items) => {
            let chrome = leftover(height, items.iter().sum());
            SubUnits::Items { items, chrome }
        }
        None => {
            log::warn!("List items could not be measured; the list will be kept whole");
            SubUnits::None
        }
    }
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// Which portion of a block a fragment covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// The block exactly as authored.
    Whole,
    /// Table body rows `rows`, with the header group repeated when `header`
    /// and the footer group attached when `footer`.
    Rows {
        rows: Range<usize>,
        header: bool,
        footer: bool,
    },
    /// List items `items`.
    Items { items: Range<usize> },
    /// An image shrunk to fit a page.
    Scaled { width: Option<f32>, height: f32 },
}

/// A placement of (part of) an arena block on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Index into the content arena.
    pub node: usize,
    pub part: Part,
    /// Height this fragment consumes on its page.
    pub height: f32,
}

impl Fragment {
    pub fn whole(node: usize, height: f32) -> Self {
        Self {
            node,
            part: Part::Whole,
            height,
        }
    }

    /// Rebuild the markup this fragment stands for.
    pub fn materialize(&self, node: &ContentNode) -> ElementNode {
        match &self.part {
            Part::Whole => node.element.clone(),
            Part::Rows {
                rows,
                header,
                footer,
            } => table::build_fragment(&node.element, rows.clone(), *header, *footer),
            Part::Items { items } => list::build_fragment(&node.element, items.clone()),
            Part::Scaled { width, height } => image::apply_size(
                &node.element,
                &image::ImageSize {
                    width: *width,
                    height: *height,
                },
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Content source
// ---------------------------------------------------------------------------

/// Cut a parsed body into top-level blocks.
///
/// Block elements become blocks as-is. Consecutive loose text and inline
/// elements are grouped into one anonymous block so they are neither dropped
/// nor measured word by word. Whitespace between blocks is discarded.
pub fn collect_blocks(nodes: &[DomNode]) -> Vec<ElementNode> {
    let mut blocks = Vec::new();
    let mut run: Vec<DomNode> = Vec::new();

    for node in nodes {
        match node {
            DomNode::Text(_) => run.push(node.clone()),
            DomNode::Element(e) if e.tag.is_inline() => run.push(node.clone()),
            DomNode::Element(e) if e.tag == Tag::Head => {}
            DomNode::Element(e) => {
                flush_run(&mut run, &mut blocks);
                blocks.push(e.clone());
            }
        }
    }
    flush_run(&mut run, &mut blocks);
    blocks
}

fn flush_run(run: &mut Vec<DomNode>, blocks: &mut Vec<ElementNode>) {
    let children = std::mem::take(run);
    if children.iter().all(|c| c.is_blank_text()) {
        return;
    }
    let start = children
        .iter()
        .position(|c| !c.is_blank_text())
        .unwrap_or(0);
    let end = children
        .iter()
        .rposition(|c| !c.is_blank_text())
        .map_or(children.len(), |i| i + 1);
    let mut anon = ElementNode::new(Tag::Anonymous);
    anon.children = children[start..end].to_vec();
    blocks.push(anon);
}

/// Measure every block up front; measurements stay fixed for the whole pass.
pub fn measure_blocks(
    blocks: Vec<ElementNode>,
    measurer: &dyn Measurer,
    constraints: &MeasureConstraints,
) -> Vec<ContentNode> {
    blocks
        .into_iter()
        .map(|element| ContentNode::measure(element, measurer, constraints))
        .collect()
}
