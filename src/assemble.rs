//! Page assembler – turns a page's fragments into its markup.

use crate::content::{ContentNode, Fragment};
use crate::layout_config::Page;

/// Build page `page_number` from its fragments. Fragment markup is
/// concatenated in order with no separators.
pub fn assemble(page_number: usize, fragments: &[Fragment], nodes: &[ContentNode]) -> Page {
    let mut content = String::new();
    for fragment in fragments {
        match nodes.get(fragment.node) {
            Some(node) => content.push_str(&fragment.materialize(node).to_html()),
            None => log::error!(
                "Page {page_number} references block {} but only {} exist",
                fragment.node,
                nodes.len()
            ),
        }
    }
    Page {
        page_number,
        is_first_page: page_number == 1,
        has_overflow: false,
        content,
        fragments: fragments.to_vec(),
    }
}
