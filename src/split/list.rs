//! List splitter – distributes items over pages, continuing ordered-list
//! numbering on each fragment.

use std::ops::Range;

use super::{overflow_index, Split};
use crate::content::{ContentNode, Fragment, Part, SubUnits};
use crate::dom::{DomNode, ElementNode, Tag};

/// The items of a list: every child except whitespace.
pub fn list_items(list: &ElementNode) -> Vec<&DomNode> {
    list.children.iter().filter(|c| !c.is_blank_text()).collect()
}

/// First ordinal of an ordered list (its `start` attribute, default 1).
pub fn start_ordinal(list: &ElementNode) -> i64 {
    list.attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
}

/// Split a list fragment so the first part fits `available`.
pub fn split_list(node: &ContentNode, fragment: &Fragment, available: f32, force_progress: bool) -> Split {
    let SubUnits::Items { items, chrome } = &node.units else {
        return Split::unsplit(fragment);
    };
    let range = match &fragment.part {
        Part::Whole => 0..items.len(),
        Part::Items { items } => items.clone(),
        _ => return Split::unsplit(fragment),
    };
    if range.is_empty() || range.end > items.len() {
        return Split::unsplit(fragment);
    }

    let k = match overflow_index(0.0, &items[range.clone()], available - chrome) {
        Some(0) if force_progress => 1,
        Some(0) => return Split::unsplit(fragment),
        Some(k) => k,
        None => range.len(),
    };

    let part = |span: Range<usize>| Fragment {
        node: fragment.node,
        height: chrome + items[span.clone()].iter().sum::<f32>(),
        part: Part::Items { items: span },
    };

    let split_at = range.start + k;
    if split_at >= range.end {
        return Split {
            first: Some(part(range)),
            second: None,
        };
    }
    Split {
        first: Some(part(range.start..split_at)),
        second: Some(part(split_at..range.end)),
    }
}

/// Rebuild a list holding `items`. Ordered fragments that do not begin at the
/// first item get a `start` attribute continuing the numbering.
pub fn build_fragment(list: &ElementNode, items: Range<usize>) -> ElementNode {
    let children = list_items(list);
    let end = items.end.min(children.len());
    let start = items.start.min(end);

    let mut out = list.shallow_clone();
    if list.tag == Tag::Ol && start > 0 {
        let offset = i64::try_from(start).unwrap_or(i64::MAX);
        out.set_attr("start", start_ordinal(list).saturating_add(offset).to_string());
    }
    out.children = children[start..end].iter().map(|n| (*n).clone()).collect();
    out
}
