//! Splitters for blocks that may straddle a page boundary.
//!
//! Splitting never touches the content arena: a split is a pair of
//! [`Fragment`]s describing which rows or items go to the current page and
//! which carry forward.

pub mod image;
pub mod list;
pub mod table;

use crate::content::Fragment;

/// Result of trying to fit a fragment into the remaining space of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Part for the current page; `None` when nothing fits.
    pub first: Option<Fragment>,
    /// Part carried to the next page; `None` when everything fit.
    pub second: Option<Fragment>,
}

impl Split {
    /// No split point: the fragment moves on unchanged.
    pub fn unsplit(fragment: &Fragment) -> Self {
        Self {
            first: None,
            second: Some(fragment.clone()),
        }
    }
}

/// Index of the first unit whose bottom edge, stacked after `lead`, passes
/// `available`. `None` when all units fit.
pub fn overflow_index(lead: f32, units: &[f32], available: f32) -> Option<usize> {
    let mut used = lead;
    for (i, h) in units.iter().enumerate() {
        used += h;
        if used > available {
            return Some(i);
        }
    }
    None
}
