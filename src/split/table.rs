//! Table splitter – distributes body rows over pages, repeating the header
//! group on every fragment.

use std::ops::Range;

use super::{overflow_index, Split};
use crate::content::{ContentNode, Fragment, Part, SubUnits};
use crate::dom::{DomNode, ElementNode, Tag};

/// A table decomposed into header rows, body rows and footer rows.
#[derive(Debug)]
pub struct TableParts<'a> {
    /// `<thead>` wrapper, if the header came from one.
    pub header_group: Option<&'a ElementNode>,
    pub header: Vec<&'a ElementNode>,
    pub body: Vec<&'a ElementNode>,
    /// Section wrapper of each body row, parallel to `body`. Rows are
    /// rebuilt inside shallow copies of their own wrapper.
    pub body_groups: Vec<Option<&'a ElementNode>>,
    pub footer_group: Option<&'a ElementNode>,
    pub footer: Vec<&'a ElementNode>,
    /// `<colgroup>`/`<col>`, repeated on every fragment.
    pub columns: Vec<&'a DomNode>,
    /// Caption and anything else, kept with the first body row only.
    pub leading: Vec<&'a DomNode>,
}

impl<'a> TableParts<'a> {
    pub fn decompose(table: &'a ElementNode) -> Self {
        let mut parts = TableParts {
            header_group: None,
            header: Vec::new(),
            body: Vec::new(),
            body_groups: Vec::new(),
            footer_group: None,
            footer: Vec::new(),
            columns: Vec::new(),
            leading: Vec::new(),
        };

        for child in &table.children {
            let DomNode::Element(e) = child else {
                if !child.is_blank_text() {
                    parts.leading.push(child);
                }
                continue;
            };
            match e.tag {
                Tag::Thead if parts.header_group.is_none() => {
                    parts.header_group = Some(e);
                    parts.header.extend(rows_of(e));
                }
                Tag::Tfoot if parts.footer_group.is_none() => {
                    parts.footer_group = Some(e);
                    parts.footer.extend(rows_of(e));
                }
                Tag::Thead | Tag::Tbody | Tag::Tfoot => {
                    for row in rows_of(e) {
                        parts.body.push(row);
                        parts.body_groups.push(Some(e));
                    }
                }
                Tag::Tr => {
                    parts.body.push(e);
                    parts.body_groups.push(None);
                }
                Tag::Colgroup | Tag::Col => parts.columns.push(child),
                _ => parts.leading.push(child),
            }
        }

        // Without <thead>, leading rows made only of <th> cells act as header.
        if parts.header_group.is_none() {
            let n = parts.body.iter().take_while(|row| is_header_row(row)).count();
            if n > 0 && n < parts.body.len() {
                parts.header = parts.body.drain(..n).collect();
                parts.body_groups.drain(..n);
            }
        }
        parts
    }
}

fn rows_of(group: &ElementNode) -> impl Iterator<Item = &ElementNode> {
    group.element_children().filter(|e| e.tag == Tag::Tr)
}

fn is_header_row(row: &ElementNode) -> bool {
    let mut cells = row.element_children().peekable();
    cells.peek().is_some() && cells.all(|c| c.tag == Tag::Th)
}

/// Split a table fragment so the first part fits `available`.
///
/// Rows are atomic. When not even one row fits and `force_progress` is set
/// (the page is empty) one row is placed anyway so allocation advances.
pub fn split_table(node: &ContentNode, fragment: &Fragment, available: f32, force_progress: bool) -> Split {
    let SubUnits::Rows {
        header,
        rows,
        footer,
        has_header,
        chrome,
        caption,
        ..
    } = &node.units
    else {
        return Split::unsplit(fragment);
    };
    let (range, with_footer) = match &fragment.part {
        Part::Whole => (0..rows.len(), true),
        Part::Rows { rows, footer, .. } => (rows.clone(), *footer),
        _ => return Split::unsplit(fragment),
    };
    if range.is_empty() || range.end > rows.len() {
        return Split::unsplit(fragment);
    }

    // Table chrome repeats on every part; the caption rides with row 0.
    let fixed = |start: usize| chrome + if start == 0 { *caption } else { 0.0 };
    let room = available - fixed(range.start);
    let lead = if *has_header { *header } else { 0.0 };
    let tail = if with_footer { *footer } else { 0.0 };
    let units = &rows[range.clone()];

    let mut k = match overflow_index(lead, units, room) {
        Some(k) => k,
        None if lead + units.iter().sum::<f32>() + tail <= room => units.len(),
        // Only the footer overflows: the last row moves on with it.
        None => units.len() - 1,
    };
    if k == 0 {
        if !force_progress {
            return Split::unsplit(fragment);
        }
        k = 1;
    }

    let part = |span: Range<usize>, with_tail: bool| {
        let body: f32 = rows[span.clone()].iter().sum();
        Fragment {
            node: fragment.node,
            part: Part::Rows {
                rows: span.clone(),
                header: *has_header,
                footer: with_tail,
            },
            height: fixed(span.start) + lead + body + if with_tail { *footer } else { 0.0 },
        }
    };

    let split_at = range.start + k;
    if split_at >= range.end {
        return Split {
            first: Some(part(range.clone(), with_footer)),
            second: None,
        };
    }
    Split {
        first: Some(part(range.start..split_at, false)),
        second: Some(part(split_at..range.end, with_footer)),
    }
}

/// Rebuild a table holding body rows `rows`, optionally with the header and
/// footer groups. Wrappers are shallow copies of the originals, so table and
/// section attributes survive on every fragment.
pub fn build_fragment(table: &ElementNode, rows: Range<usize>, header: bool, footer: bool) -> ElementNode {
    let parts = TableParts::decompose(table);
    let mut out = table.shallow_clone();

    if rows.start == 0 {
        out.children.extend(parts.leading.iter().map(|n| (*n).clone()));
    }
    out.children.extend(parts.columns.iter().map(|n| (*n).clone()));

    if header && !parts.header.is_empty() {
        out.children
            .extend(wrap_rows(parts.header_group, &parts.header));
    }

    let end = rows.end.min(parts.body.len());
    let start = rows.start.min(end);
    let mut i = start;
    while i < end {
        let group = parts.body_groups[i];
        let run = parts.body_groups[i..end]
            .iter()
            .take_while(|g| same_group(**g, group))
            .count();
        out.children.extend(wrap_rows(group, &parts.body[i..i + run]));
        i += run;
    }

    if footer && !parts.footer.is_empty() {
        out.children
            .extend(wrap_rows(parts.footer_group, &parts.footer));
    }
    out
}

fn same_group(a: Option<&ElementNode>, b: Option<&ElementNode>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => std::ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn wrap_rows(group: Option<&ElementNode>, rows: &[&ElementNode]) -> Vec<DomNode> {
    let rows = rows.iter().map(|r| DomNode::Element((*r).clone()));
    match group {
        Some(g) => {
            let mut wrapper = g.shallow_clone();
            wrapper.children.extend(rows);
            vec![DomNode::Element(wrapper)]
        }
        None => rows.collect(),
    }
}
