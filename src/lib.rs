//! # notice-pager – pagination engine for rich HTML notices
//!
//! This crate lays the HTML body produced by a rich-text notice editor out
//! into fixed-size print pages: a first page under a full letterhead and
//! continuation pages under a condensed header band. The pipeline stages are:
//!
//! 1. **Parse** – HTML string → DOM tree ([`dom`])
//! 2. **Extract** – top-level blocks, classified and measured once
//!    ([`content`], [`measure`], [`style`], [`fonts`])
//! 3. **Paginate** – greedy flow allocation with table/list splitting,
//!    heading-orphan control and image downscaling ([`pagination`], [`split`])
//! 4. **Assemble** – page markup from fragments ([`assemble`], [`layout_config`])
//! 5. **Render** – print-ready HTML with letterhead and footers ([`render`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod assemble;
pub mod content;
pub mod dom;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod geometry;
pub mod layout_config;
pub mod measure;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod split;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use error::{PaginationError, Result};
pub use geometry::{Geometry, PageClass};
pub use layout_config::{Page, PaginatedDocument};
pub use measure::{AnnotatedMeasurer, Measurer, TextMetricsMeasurer};
pub use pagination::{paginate, PaginationPolicy};
pub use pipeline::{generate_print_html, paginate_html, paginate_html_default, PipelineConfig};
