//! Layout config – the frozen representation between pagination and
//! rendering. It records exactly what goes on each page, as markup for the
//! print renderer and as fragments for conservation checks.

use serde::{Deserialize, Serialize};

use crate::content::Fragment;
use crate::error::Result;
use crate::geometry::Geometry;

/// A complete paginated document ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedDocument {
    /// Document title shown in the letterhead and the `<title>` element.
    #[serde(default = "PaginatedDocument::default_title")]
    pub title: String,
    /// Geometry the pages were laid out against.
    #[serde(default)]
    pub geometry: Geometry,
    /// Ordered list of pages, numbered from 1 without gaps.
    pub pages: Vec<Page>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub page_number: usize,
    pub is_first_page: bool,
    /// Always `false`: oversized blocks are placed (and logged) rather than
    /// flagged.
    pub has_overflow: bool,
    /// Serialized markup of the page's fragments, in order.
    pub content: String,
    /// What was placed on this page.
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

impl PaginatedDocument {
    pub fn new(title: impl Into<String>, geometry: Geometry, pages: Vec<Page>) -> Self {
        Self {
            title: title.into(),
            geometry,
            pages,
        }
    }

    fn default_title() -> String {
        "Notice".to_string()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
