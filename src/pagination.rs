//! Pagination – distributes measured content blocks over fixed-height pages.
//!
//! Handles:
//! - Separate budgets for the first page and continuation pages
//! - Page-break-before / page-break-after hints
//! - Table row splitting with the header repeated on every fragment
//! - List item splitting with ordered numbering continued
//! - Orphan avoidance for headings
//! - Downscaling of images taller than a page
//!
//! The allocator is a single greedy pass. It never backtracks and never
//! reorders content: concatenating the fragments of all pages in order gives
//! back exactly the input blocks.

use serde::{Deserialize, Serialize};

use crate::content::{BlockKind, ContentNode, Fragment, Part};
use crate::error::{PaginationError, Result};
use crate::geometry::{Geometry, PageClass};
use crate::layout_config::Page;
use crate::split::{image, list, table, Split};

/// Tunable thresholds of the allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
    /// A heading is not left at the bottom of a page with less room than
    /// this (px) when more content follows.
    pub heading_orphan_threshold: f32,
    /// Fraction of the page that counts as "near the bottom" for overflowing
    /// headings.
    pub page_bottom_threshold: f32,
    /// Room kept free below a downscaled image (px).
    pub image_margin: f32,
    /// Height assumed for an image with no known size (px).
    pub default_image_height: f32,
    /// Honor `page-break-before/after` styles and break classes.
    pub honor_break_hints: bool,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            heading_orphan_threshold: 50.0,
            page_bottom_threshold: 0.8,
            image_margin: 40.0,
            default_image_height: 400.0,
            honor_break_hints: true,
        }
    }
}

impl PaginationPolicy {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("heading_orphan_threshold", self.heading_orphan_threshold),
            ("page_bottom_threshold", self.page_bottom_threshold),
            ("image_margin", self.image_margin),
            ("default_image_height", self.default_image_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PaginationError::InvalidGeometry(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.page_bottom_threshold > 1.0 {
            return Err(PaginationError::InvalidGeometry(format!(
                "page_bottom_threshold must be within 0..=1, got {}",
                self.page_bottom_threshold
            )));
        }
        Ok(())
    }
}

/// Fragments assigned to one page, before markup is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub page_number: usize,
    pub class: PageClass,
    pub fragments: Vec<Fragment>,
    /// Sum of fragment heights.
    pub used_height: f32,
}

/// Distribute `nodes` over pages and assemble each page's markup.
///
/// Fails only when the geometry or policy leaves no room to paginate; content
/// anomalies are absorbed (and logged).
pub fn paginate(nodes: &[ContentNode], geometry: &Geometry, policy: &PaginationPolicy) -> Result<Vec<Page>> {
    let plans = allocate(nodes, geometry, policy)?;
    let pages: Vec<Page> = plans
        .iter()
        .map(|plan| crate::assemble::assemble(plan.page_number, &plan.fragments, nodes))
        .collect();
    log::info!("Paginated {} blocks into {} pages", nodes.len(), pages.len());
    Ok(pages)
}

/// Assign fragments of `nodes` to pages without materializing markup.
pub fn allocate(nodes: &[ContentNode], geometry: &Geometry, policy: &PaginationPolicy) -> Result<Vec<PagePlan>> {
    geometry.validate()?;
    policy.validate()?;
    let allocator = FlowAllocator {
        nodes,
        policy,
        first_budget: geometry.available_height(PageClass::First)?,
        continuation_budget: geometry.available_height(PageClass::Continuation)?,
        pages: Vec::new(),
        current: Vec::new(),
        current_height: 0.0,
    };
    Ok(allocator.run())
}

struct FlowAllocator<'a> {
    nodes: &'a [ContentNode],
    policy: &'a PaginationPolicy,
    first_budget: f32,
    continuation_budget: f32,
    pages: Vec<PagePlan>,
    current: Vec<Fragment>,
    current_height: f32,
}

impl FlowAllocator<'_> {
    fn run(mut self) -> Vec<PagePlan> {
        let nodes = self.nodes;
        let hints = self.policy.honor_break_hints;

        for (index, node) in nodes.iter().enumerate() {
            if hints && node.break_before {
                log::debug!("Forced break before block {index}");
                self.flush();
            }

            match node.height {
                Some(height) => {
                    let next = nodes.get(index + 1);
                    let mut pending = Some(Fragment::whole(index, height));
                    while let Some(fragment) = pending.take() {
                        pending = self.place(fragment, next);
                    }
                }
                None => {
                    // Unmeasurable: give it a page of its own from here on.
                    log::warn!("Block {index} has no measurement; moving it whole to a fresh page");
                    self.flush();
                    let budget = self.remaining();
                    self.push(Fragment::whole(index, budget));
                }
            }

            if hints && node.break_after {
                log::debug!("Forced break after block {index}");
                self.flush();
            }
        }
        self.flush();

        if self.pages.is_empty() {
            self.pages.push(PagePlan {
                page_number: 1,
                class: PageClass::First,
                fragments: Vec::new(),
                used_height: 0.0,
            });
        }
        self.pages
    }

    fn page_number(&self) -> usize {
        self.pages.len() + 1
    }

    fn full_budget(&self) -> f32 {
        match PageClass::for_page(self.page_number()) {
            PageClass::First => self.first_budget,
            PageClass::Continuation => self.continuation_budget,
        }
    }

    fn remaining(&self) -> f32 {
        self.full_budget() - self.current_height
    }

    fn push(&mut self, fragment: Fragment) {
        self.current_height += fragment.height;
        self.current.push(fragment);
    }

    /// Close the current page. An empty page is never emitted.
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let page_number = self.page_number();
        log::debug!(
            "Page {page_number}: {} fragments, {:.1}/{:.1}px",
            self.current.len(),
            self.current_height,
            self.full_budget()
        );
        self.pages.push(PagePlan {
            page_number,
            class: PageClass::for_page(page_number),
            fragments: std::mem::take(&mut self.current),
            used_height: self.current_height,
        });
        self.current_height = 0.0;
    }

    /// Place `fragment`, returning a remainder still to be placed.
    fn place(&mut self, fragment: Fragment, next: Option<&ContentNode>) -> Option<Fragment> {
        let nodes = self.nodes;
        let node = &nodes[fragment.node];
        let budget = self.remaining();

        if fragment.height <= budget {
            if self.keep_with_next(node, &fragment, next, budget) {
                log::debug!("Moving heading {} forward to keep it with what follows", fragment.node);
                self.flush();
            }
            self.push(fragment);
            return None;
        }

        match node.kind {
            BlockKind::Heading => {
                self.place_overflowing_heading(fragment, next.is_some(), budget);
                None
            }
            BlockKind::Image => {
                self.place_image(node, fragment);
                None
            }
            BlockKind::Table | BlockKind::List if node.splittable() => self.split(node, fragment, budget),
            _ => {
                self.move_whole(fragment);
                None
            }
        }
    }

    /// A heading that fits but would leave too little room for the start of
    /// the next block goes to the next page with it.
    fn keep_with_next(&self, node: &ContentNode, fragment: &Fragment, next: Option<&ContentNode>, budget: f32) -> bool {
        if node.kind != BlockKind::Heading || self.current.is_empty() {
            return false;
        }
        if budget >= self.policy.heading_orphan_threshold {
            return false;
        }
        match next.and_then(|n| n.leading_height()) {
            Some(lead) => fragment.height + lead > budget,
            None => next.is_some(),
        }
    }

    fn place_overflowing_heading(&mut self, fragment: Fragment, has_next: bool, budget: f32) {
        let near_bottom = self.current_height > self.full_budget() * self.policy.page_bottom_threshold;
        if (has_next && budget < self.policy.heading_orphan_threshold) || near_bottom {
            self.flush();
            self.push(fragment);
        } else {
            // Let it overflow here; the rest of the document starts fresh.
            self.push(fragment);
            self.flush();
        }
    }

    fn place_image(&mut self, node: &ContentNode, fragment: Fragment) {
        self.flush();
        let budget = self.full_budget();
        if fragment.height > budget {
            let scaled = image::rescale(
                &node.element,
                node.height,
                budget,
                self.policy.image_margin,
                self.policy.default_image_height,
            );
            match scaled {
                Some(size) => {
                    self.push(Fragment {
                        node: fragment.node,
                        part: Part::Scaled {
                            width: size.width,
                            height: size.height,
                        },
                        height: size.height,
                    });
                    return;
                }
                None => log::warn!(
                    "Image block {} is {:.1}px tall on a {budget:.1}px page and could not be scaled",
                    fragment.node,
                    fragment.height
                ),
            }
        }
        self.push(fragment);
    }

    fn split(&mut self, node: &ContentNode, fragment: Fragment, budget: f32) -> Option<Fragment> {
        let force_progress = self.current.is_empty();
        let Split { first, second } = match node.kind {
            BlockKind::Table => table::split_table(node, &fragment, budget, force_progress),
            _ => list::split_list(node, &fragment, budget, force_progress),
        };
        match first {
            Some(first) => {
                log::debug!(
                    "Split block {} at page {}: {:.1}px here, {:.1}px carried",
                    fragment.node,
                    self.page_number(),
                    first.height,
                    second.as_ref().map_or(0.0, |s| s.height)
                );
                self.push(first);
                self.flush();
                second
            }
            None if force_progress => {
                log::warn!("Block {} has no split point; placing it whole", fragment.node);
                self.push(fragment);
                None
            }
            None => {
                self.flush();
                Some(fragment)
            }
        }
    }

    fn move_whole(&mut self, fragment: Fragment) {
        self.flush();
        if fragment.height > self.full_budget() {
            log::warn!(
                "Block {} ({:.1}px) is taller than page {} and will overflow",
                fragment.node,
                fragment.height,
                self.page_number()
            );
        }
        self.push(fragment);
    }
}

/// Rebuild the block sequence from the fragments of `pages`.
///
/// Checks that every block appears in order and that split blocks are covered
/// by contiguous, non-overlapping ranges of all their rows or items.
pub fn reconstruct(pages: &[Page], nodes: &[ContentNode]) -> Result<Vec<ContentNode>> {
    let mut fragments = pages.iter().flat_map(|p| &p.fragments).peekable();
    let mut out = Vec::with_capacity(nodes.len());

    for (index, node) in nodes.iter().enumerate() {
        let mut cursor = 0usize;
        let mut whole = false;
        let mut seen = false;

        while let Some(fragment) = fragments.next_if(|f| f.node == index) {
            if whole {
                return Err(PaginationError::Conservation(format!(
                    "block {index} placed again after being placed whole"
                )));
            }
            match &fragment.part {
                Part::Whole | Part::Scaled { .. } if !seen => whole = true,
                Part::Rows { rows: range, .. } | Part::Items { items: range } if range.start == cursor => {
                    cursor = range.end;
                }
                other => {
                    return Err(PaginationError::Conservation(format!(
                        "block {index} has out-of-order fragment {other:?} at unit {cursor}"
                    )))
                }
            }
            seen = true;
        }

        if !seen {
            return Err(PaginationError::Conservation(format!("block {index} was never placed")));
        }
        if !whole && Some(cursor) != node.unit_count() {
            return Err(PaginationError::Conservation(format!(
                "block {index} covers {cursor} of {:?} units",
                node.unit_count()
            )));
        }
        out.push(node.clone());
    }

    if let Some(extra) = fragments.next() {
        return Err(PaginationError::Conservation(format!(
            "fragment for block {} is out of sequence",
            extra.node
        )));
    }
    Ok(out)
}
