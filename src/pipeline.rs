//! Pipeline – ties together parsing, block extraction, measurement,
//! pagination and rendering into a single function call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::content::{collect_blocks, measure_blocks, ContentNode};
use crate::dom::{body_children, parse_html};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::geometry::Geometry;
use crate::layout_config::PaginatedDocument;
use crate::measure::{AnnotatedMeasurer, Measurer, TextMetricsMeasurer};
use crate::pagination::{paginate, PaginationPolicy};
use crate::render::{render_print_html, FooterLink, Letterhead, RenderOptions};

pub use crate::pagination::reconstruct;

/// Configuration for the pagination pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document title (default: "Notice").
    pub title: String,
    pub geometry: Geometry,
    pub policy: PaginationPolicy,
    /// Printed on page 1 (full) and later pages (reference only).
    pub letterhead: Option<Letterhead>,
    pub footer_links: Vec<FooterLink>,
    pub show_page_numbers: bool,
    /// TTF used by the text-metrics measurer instead of width heuristics.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Notice".to_string(),
            geometry: Geometry::a4_notice(),
            policy: PaginationPolicy::default(),
            letterhead: None,
            footer_links: Vec::new(),
            show_page_numbers: true,
            font_path: None,
        }
    }
}

impl PipelineConfig {
    /// On-screen preview layout.
    pub fn a4_preview() -> Self {
        Self {
            geometry: Geometry::a4_preview(),
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            title: Some(self.title.clone()),
            letterhead: self.letterhead.clone(),
            footer_links: self.footer_links.clone(),
            show_page_numbers: self.show_page_numbers,
        }
    }

    /// Annotated heights first, text metrics (with the configured font, if
    /// any) for everything else.
    pub fn default_measurer(&self) -> Result<AnnotatedMeasurer> {
        let mut fonts = FontManager::default();
        if let Some(path) = &self.font_path {
            fonts.load_font_file(path)?;
        }
        Ok(AnnotatedMeasurer::with_fallback(TextMetricsMeasurer::new(fonts)))
    }
}

/// Parse `html` and measure its top-level blocks.
pub fn build_nodes(html: &str, geometry: &Geometry, measurer: &dyn Measurer) -> Vec<ContentNode> {
    let dom = parse_html(html);
    let blocks = collect_blocks(&body_children(&dom));
    log::debug!("Extracted {} top-level blocks", blocks.len());
    measure_blocks(blocks, measurer, &geometry.constraints())
}

/// Full pipeline: HTML string → paginated document.
///
/// Geometry and policy are validated before any parsing or measurement.
pub fn paginate_html(html: &str, config: &PipelineConfig, measurer: &dyn Measurer) -> Result<PaginatedDocument> {
    config.geometry.validate()?;
    config.policy.validate()?;
    let nodes = build_nodes(html, &config.geometry, measurer);
    let pages = paginate(&nodes, &config.geometry, &config.policy)?;
    Ok(PaginatedDocument::new(
        config.title.clone(),
        config.geometry.clone(),
        pages,
    ))
}

/// Convenience: paginate with the config's default measurer.
pub fn paginate_html_default(html: &str, config: &PipelineConfig) -> Result<PaginatedDocument> {
    config.geometry.validate()?;
    let measurer = config.default_measurer()?;
    paginate_html(html, config, &measurer)
}

/// Paginate and render print HTML.
///
/// Returns `(print_html, document)`.
pub fn generate_print_html(html: &str, config: &PipelineConfig) -> Result<(String, PaginatedDocument)> {
    let doc = paginate_html_default(html, config)?;
    let print = render_print_html(&doc, &config.render_options());
    Ok((print, doc))
}
