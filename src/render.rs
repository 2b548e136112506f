//! Print renderer – wraps a [`PaginatedDocument`] into one print-ready HTML
//! document: one fixed-size sheet per page, the full letterhead on page 1, a
//! condensed header band on later pages and a footer on every page.
//!
//! Header and footer bands are sized from the same [`Geometry`] the allocator
//! budgeted with, so the printed content area matches the paginated one.

use serde::{Deserialize, Serialize};

use crate::dom::escape_html;
use crate::geometry::{Geometry, PageClass};
use crate::layout_config::{Page, PaginatedDocument};

/// Addressee block printed on the first page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Letterhead {
    /// Label in front of the reference, e.g. "Tax Reference Number".
    pub reference_label: String,
    pub reference: String,
    pub date: String,
    /// Printed under the reference when set.
    pub quote_note: Option<String>,
    pub recipient_name: String,
    pub recipient_address: Vec<String>,
    /// Logo image source (URL or data URI) shown on the right of both header
    /// bands.
    pub logo_src: Option<String>,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            reference_label: "Reference Number".to_string(),
            reference: String::new(),
            date: String::new(),
            quote_note: None,
            recipient_name: String::new(),
            recipient_address: Vec::new(),
            logo_src: None,
        }
    }
}

/// A link printed in the footer, e.g. `Website: www.example.gov`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub text: String,
    pub url: String,
}

/// Presentation options for [`render_print_html`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Overrides the document title when set.
    pub title: Option<String>,
    pub letterhead: Option<Letterhead>,
    pub footer_links: Vec<FooterLink>,
    pub show_page_numbers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            letterhead: None,
            footer_links: Vec::new(),
            show_page_numbers: true,
        }
    }
}

/// Render all pages into one HTML document.
pub fn render_print_html(doc: &PaginatedDocument, options: &RenderOptions) -> String {
    let title = options.title.as_deref().unwrap_or(&doc.title);
    let total = doc.pages.len();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("<style>\n");
    out.push_str(&stylesheet(&doc.geometry));
    out.push_str("</style>\n</head>\n<body>\n");

    for page in &doc.pages {
        render_page(&mut out, page, total, title, &doc.geometry, options);
    }

    out.push_str("</body>\n</html>\n");
    log::info!("Rendered {total} pages of print HTML ({} bytes)", out.len());
    out
}

fn render_page(
    out: &mut String,
    page: &Page,
    total: usize,
    title: &str,
    geometry: &Geometry,
    options: &RenderOptions,
) {
    let class = PageClass::for_page(page.page_number);
    out.push_str(&format!(
        "<div class=\"print-page\" data-page=\"{}\">\n",
        page.page_number
    ));

    if geometry.header_height(class) > 0.0 {
        match class {
            PageClass::First => {
                out.push_str("<header class=\"letterhead\">\n");
                if let Some(letterhead) = &options.letterhead {
                    full_letterhead(out, letterhead);
                }
                if !title.is_empty() {
                    out.push_str(&format!(
                        "<div class=\"document-title\"><h1>{}</h1></div>\n",
                        escape_html(title)
                    ));
                }
                out.push_str("</header>\n");
            }
            PageClass::Continuation => {
                out.push_str("<header class=\"letterhead-continuation\">\n");
                if let Some(letterhead) = &options.letterhead {
                    out.push_str(&format!(
                        "<div class=\"header-left\"><p class=\"reference\">{}: <strong>{}</strong></p></div>\n",
                        escape_html(&letterhead.reference_label),
                        escape_html(&letterhead.reference)
                    ));
                    logo(out, letterhead);
                }
                out.push_str("</header>\n");
            }
        }
    }

    let continued = if page.is_first_page { "" } else { " continued" };
    out.push_str(&format!("<main class=\"document-body{continued}\">"));
    out.push_str(&page.content);
    out.push_str("</main>\n");

    if geometry.footer_height > 0.0 {
        footer(out, page.page_number, total, options);
    }
    out.push_str("</div>\n");
}

fn full_letterhead(out: &mut String, letterhead: &Letterhead) {
    out.push_str("<div class=\"header-left\">\n");
    out.push_str(&format!(
        "<p class=\"reference\">{}: <strong>{}</strong></p>\n",
        escape_html(&letterhead.reference_label),
        escape_html(&letterhead.reference)
    ));
    if !letterhead.date.is_empty() {
        out.push_str(&format!(
            "<p class=\"date\">Date: {}</p>\n",
            escape_html(&letterhead.date)
        ));
    }
    if let Some(note) = &letterhead.quote_note {
        out.push_str(&format!("<p class=\"quote-note\">{}</p>\n", escape_html(note)));
    }
    out.push_str("<div class=\"recipient\">\n");
    out.push_str(&format!(
        "<p><strong>{}</strong></p>\n",
        escape_html(&letterhead.recipient_name)
    ));
    for line in &letterhead.recipient_address {
        out.push_str(&format!("<p>{}</p>\n", escape_html(line)));
    }
    out.push_str("</div>\n</div>\n");
    logo(out, letterhead);
}

fn logo(out: &mut String, letterhead: &Letterhead) {
    if let Some(src) = &letterhead.logo_src {
        out.push_str(&format!(
            "<div class=\"header-right\"><img src=\"{}\" alt=\"\"></div>\n",
            escape_html(src)
        ));
    }
}

fn footer(out: &mut String, page_number: usize, total: usize, options: &RenderOptions) {
    out.push_str("<footer class=\"page-footer\">\n<div class=\"footer-left\">");
    let links: Vec<String> = options
        .footer_links
        .iter()
        .map(|link| {
            format!(
                "<span class=\"footer-text\">{}: <a href=\"{}\">{}</a></span>",
                escape_html(&link.label),
                escape_html(&link.url),
                escape_html(&link.text)
            )
        })
        .collect();
    out.push_str(&links.join("<span class=\"footer-separator\">&bull;</span>"));
    out.push_str("</div>\n");
    if options.show_page_numbers {
        out.push_str(&format!(
            "<div class=\"footer-right\"><span class=\"page-number\">Page {page_number} of {total}</span></div>\n"
        ));
    }
    out.push_str("</footer>\n");
}

fn stylesheet(g: &Geometry) -> String {
    format!(
        "@page {{ size: {w}px {h}px; margin: 0; }}
* {{ box-sizing: border-box; }}
html, body {{ margin: 0; padding: 0; }}
body {{ font-family: Arial, Helvetica, sans-serif; font-size: {fs}px; line-height: {lh}; color: #333; }}
.print-page {{ position: relative; width: {w}px; height: {h}px; padding: {mt}px {mr}px {mb}px {ml}px; overflow: hidden; display: flex; flex-direction: column; page-break-after: always; page-break-inside: avoid; }}
.print-page:last-child {{ page-break-after: auto; }}
.letterhead {{ flex: none; height: {hf}px; display: flex; flex-wrap: wrap; justify-content: space-between; overflow: hidden; }}
.letterhead-continuation {{ flex: none; height: {hc}px; display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #ccc; overflow: hidden; }}
.header-left p {{ margin: 0 0 2px; }}
.header-right img {{ max-height: 60px; }}
.quote-note {{ font-size: 10px; font-style: italic; }}
.recipient {{ margin-top: 12px; }}
.document-title {{ width: 100%; }}
.document-title h1 {{ font-size: 16px; margin: 8px 0 0; }}
.document-body {{ flex: 1; min-height: 0; overflow: hidden; }}
.document-body table {{ width: 100%; border-collapse: collapse; }}
.document-body img {{ max-width: 100%; }}
.page-footer {{ flex: none; height: {ft}px; display: flex; justify-content: space-between; align-items: flex-end; font-size: 10px; color: #666; }}
.footer-separator {{ margin: 0 6px; }}
",
        w = g.page_width,
        h = g.page_height,
        fs = g.font_size,
        lh = g.line_height,
        mt = g.margin_top,
        mr = g.margin_right,
        mb = g.margin_bottom,
        ml = g.margin_left,
        hf = g.first_page_header_height,
        hc = g.continuation_header_height,
        ft = g.footer_height,
    )
}
