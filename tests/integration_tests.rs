//! Integration tests for the notice-pager pipeline.
//!
//! These tests validate:
//! - Page budgets, greedy filling and forced breaks
//! - Table and list splitting across pages
//! - Heading orphan control and image downscaling
//! - Content conservation, page numbering and determinism
//! - Print HTML rendering

use notice_pager::content::{collect_blocks, BlockKind, Fragment, Part};
use notice_pager::dom::{parse_html, DomNode, ElementNode, Tag};
use notice_pager::geometry::{Geometry, PageClass};
use notice_pager::layout_config::PaginatedDocument;
use notice_pager::measure::{AnnotatedMeasurer, Measurer};
use notice_pager::pagination::{paginate, PaginationPolicy};
use notice_pager::pipeline::{
    build_nodes, generate_print_html, paginate_html, paginate_html_default, reconstruct, PipelineConfig,
};
use notice_pager::render::{FooterLink, Letterhead};
use notice_pager::split::table::split_table;
use notice_pager::templates;
use sha2::{Digest, Sha256};

// =====================================================================
// Helpers
// =====================================================================

/// Geometry with exactly `first` and `continuation` px of content budget.
fn geometry(first: f32, continuation: f32) -> Geometry {
    let page_height = first.max(continuation);
    Geometry {
        page_height,
        margin_top: 0.0,
        margin_bottom: 0.0,
        first_page_header_height: page_height - first,
        continuation_header_height: page_height - continuation,
        footer_height: 0.0,
        ..Geometry::a4_notice()
    }
}

fn annotated_config(first: f32, continuation: f32) -> PipelineConfig {
    PipelineConfig {
        geometry: geometry(first, continuation),
        ..PipelineConfig::default()
    }
}

fn paginate_annotated(html: &str, config: &PipelineConfig) -> PaginatedDocument {
    paginate_html(html, config, &AnnotatedMeasurer::strict()).unwrap()
}

fn paragraphs(heights: &[f32]) -> String {
    heights
        .iter()
        .enumerate()
        .map(|(i, h)| format!("<p data-height=\"{h}\">Paragraph {}</p>", i + 1))
        .collect()
}

fn page_nodes(doc: &PaginatedDocument) -> Vec<Vec<usize>> {
    doc.pages
        .iter()
        .map(|p| p.fragments.iter().map(|f| f.node).collect())
        .collect()
}

fn assert_pages_numbered(doc: &PaginatedDocument) {
    for (i, page) in doc.pages.iter().enumerate() {
        assert_eq!(page.page_number, i + 1);
        assert_eq!(page.is_first_page, i == 0);
        assert!(!page.has_overflow);
    }
}

fn sha256_hex(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// =====================================================================
// Basic allocation
// =====================================================================

#[test]
fn empty_content_gives_one_empty_first_page() {
    let doc = paginate_annotated("", &annotated_config(500.0, 500.0));
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages[0].page_number, 1);
    assert!(doc.pages[0].is_first_page);
    assert_eq!(doc.pages[0].content, "");

    let whitespace = paginate_annotated("  \n\t ", &annotated_config(500.0, 500.0));
    assert_eq!(whitespace.pages, doc.pages);
}

#[test]
fn five_paragraphs_fill_three_then_two() {
    let html = paragraphs(&[150.0; 5]);
    let doc = paginate_annotated(&html, &annotated_config(500.0, 500.0));
    assert_eq!(page_nodes(&doc), vec![vec![0, 1, 2], vec![3, 4]]);
    assert!(doc.pages[0].content.starts_with("<p data-height=\"150\">Paragraph 1</p>"));
    assert!(doc.pages[1].content.contains("Paragraph 4"));
    assert_pages_numbered(&doc);
}

#[test]
fn continuation_pages_use_their_own_budget() {
    let html = paragraphs(&[100.0; 5]);
    // Letterhead leaves 100px on page 1; the condensed band leaves 300px.
    let doc = paginate_annotated(&html, &annotated_config(100.0, 300.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1, 2, 3], vec![4]]);
}

#[test]
fn page_break_hints_start_new_pages() {
    let html = r#"
        <p data-height="10">Summary</p>
        <div class="page-break" data-height="0"></div>
        <h2 data-height="20">Details</h2>
        <p data-height="10" style="page-break-after: always">Computation</p>
        <p data-height="10">Appendix</p>
    "#;
    let doc = paginate_annotated(html, &annotated_config(500.0, 500.0));
    assert_eq!(doc.page_count(), 3);
    assert!(doc.pages[1].content.contains("Details"));
    assert!(doc.pages[2].content.contains("Appendix"));

    let ignoring = PipelineConfig {
        policy: PaginationPolicy {
            honor_break_hints: false,
            ..PaginationPolicy::default()
        },
        ..annotated_config(500.0, 500.0)
    };
    assert_eq!(paginate_annotated(html, &ignoring).page_count(), 1);
}

#[test]
fn oversized_paragraph_overflows_on_its_own_page() {
    let html = paragraphs(&[50.0, 900.0, 50.0]);
    let doc = paginate_annotated(&html, &annotated_config(500.0, 500.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1], vec![2]]);
    assert!(doc.pages.iter().all(|p| !p.has_overflow));
}

#[test]
fn unannotated_block_moves_whole_with_strict_measurer() {
    let html = r#"<p data-height="50">Known</p><p>Unknown</p><p data-height="50">After</p>"#;
    let doc = paginate_annotated(html, &annotated_config(500.0, 500.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1], vec![2]]);
    assert_eq!(doc.pages[1].fragments[0].height, 500.0);
}

// =====================================================================
// Headings
// =====================================================================

#[test]
fn heading_near_page_bottom_moves_with_its_paragraph() {
    let html = r#"
        <p data-height="470">Opening</p>
        <h2 data-height="20">Payment Instructions</h2>
        <p data-height="400">Body</p>
    "#;
    let doc = paginate_annotated(html, &annotated_config(500.0, 500.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1, 2]]);
    assert!(doc.pages[1].content.starts_with("<h2"));
}

#[test]
fn orphan_threshold_is_configurable() {
    let html = r#"
        <p data-height="470">Opening</p>
        <h2 data-height="20">Payment Instructions</h2>
        <p data-height="400">Body</p>
    "#;
    let relaxed = PipelineConfig {
        policy: PaginationPolicy {
            heading_orphan_threshold: 10.0,
            ..PaginationPolicy::default()
        },
        ..annotated_config(500.0, 500.0)
    };
    let doc = paginate_annotated(html, &relaxed);
    assert_eq!(page_nodes(&doc), vec![vec![0, 1], vec![2]]);
}

// =====================================================================
// Tables
// =====================================================================

fn annotated_table(rows: usize) -> String {
    let body: String = (0..rows)
        .map(|i| format!("<tr data-height=\"10\"><td>Row {}</td></tr>", i + 1))
        .collect();
    format!(
        "<table data-height=\"{}\"><thead><tr data-height=\"5\"><th>Item</th></tr></thead><tbody>{body}</tbody></table>",
        5 + rows * 10
    )
}

#[test]
fn table_split_repeats_header_in_each_fragment() {
    let config = annotated_config(500.0, 500.0);
    let nodes = build_nodes(&annotated_table(20), &config.geometry, &AnnotatedMeasurer::strict());
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind, BlockKind::Table);

    let split = split_table(&nodes[0], &Fragment::whole(0, 205.0), 55.0, false);
    let first = split.first.unwrap();
    let second = split.second.unwrap();
    assert_eq!(
        first.part,
        Part::Rows {
            rows: 0..5,
            header: true,
            footer: false
        }
    );
    assert_eq!(first.height, 55.0);
    assert_eq!(
        second.part,
        Part::Rows {
            rows: 5..20,
            header: true,
            footer: true
        }
    );
    assert_eq!(second.height, 155.0);

    let markup = first.materialize(&nodes[0]).to_html();
    assert!(markup.contains("<thead>"));
    assert!(markup.contains("Row 5"));
    assert!(!markup.contains("Row 6"));
    let markup = second.materialize(&nodes[0]).to_html();
    assert!(markup.contains("<thead>"));
    assert!(markup.contains("Row 6") && markup.contains("Row 20"));
}

#[test]
fn table_on_continuation_page_is_split_across_pages() {
    let html = format!(
        "<p data-height=\"10\" style=\"page-break-after: always\">Cover</p>{}",
        annotated_table(20)
    );
    let config = annotated_config(500.0, 55.0);
    let doc = paginate_annotated(&html, &config);
    // 5 rows per continuation page after the cover page.
    assert_eq!(doc.page_count(), 5);
    for page in &doc.pages[1..] {
        assert!(page.content.starts_with("<table"));
        assert!(page.content.contains("<thead><tr data-height=\"5\"><th>Item</th></tr></thead>"));
        assert_eq!(page.fragments[0].height, 55.0);
    }
}

#[test]
fn long_statement_table_keeps_headers_with_text_metrics() {
    let html = templates::long_table_template(120);
    let doc = paginate_html_default(&html, &PipelineConfig::default()).unwrap();
    assert!(doc.page_count() > 1);
    for page in &doc.pages {
        if page.content.contains("<tbody>") {
            assert!(page.content.contains("<thead>"), "page {} lost its header", page.page_number);
        }
    }
    assert_eq!(
        doc.pages.iter().filter(|p| p.content.contains("<tfoot>")).count(),
        1
    );
}

// =====================================================================
// Lists
// =====================================================================

#[test]
fn ordered_list_numbering_continues_on_next_page() {
    let items: String = (1..=10)
        .map(|i| format!("<li data-height=\"20\">Item {i}</li>"))
        .collect();
    let html = format!("<ol data-height=\"200\">{items}</ol>");
    let doc = paginate_annotated(&html, &annotated_config(120.0, 500.0));
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[0].content.contains("Item 6"));
    assert!(!doc.pages[0].content.contains("start="));
    assert!(doc.pages[1].content.starts_with("<ol"));
    assert!(doc.pages[1].content.contains("start=\"7\""));
    assert!(doc.pages[1].content.contains("<li data-height=\"20\">Item 7</li>"));
}

#[test]
fn ordered_list_with_custom_start_continues_from_it() {
    let items: String = (0..4).map(|i| format!("<li data-height=\"30\">Step {i}</li>")).collect();
    let html = format!("<ol start=\"5\" data-height=\"120\">{items}</ol>");
    let doc = paginate_annotated(&html, &annotated_config(60.0, 60.0));
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[1].content.contains("start=\"7\""));
}

#[test]
fn unordered_list_split_has_no_start_attribute() {
    let items: String = (0..6).map(|i| format!("<li data-height=\"30\">Point {i}</li>")).collect();
    let html = format!("<ul data-height=\"180\">{items}</ul>");
    let doc = paginate_annotated(&html, &annotated_config(100.0, 100.0));
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages.iter().all(|p| !p.content.contains("start=")));
}

#[test]
fn avoid_split_list_moves_whole() {
    let items: String = (0..4).map(|i| format!("<li data-height=\"30\">Point {i}</li>")).collect();
    let html = format!(
        "<p data-height=\"50\">Intro</p><ul style=\"page-break-inside: avoid\" data-height=\"120\">{items}</ul>"
    );
    let doc = paginate_annotated(&html, &annotated_config(150.0, 150.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1]]);
    assert_eq!(doc.pages[1].fragments[0].part, Part::Whole);
}

// =====================================================================
// Images
// =====================================================================

#[test]
fn oversized_image_is_downscaled_preserving_aspect_ratio() {
    let html = r#"<p data-height="1000"><img src="scan.png" data-natural-width="500" data-natural-height="1000"></p>"#;
    let doc = paginate_annotated(html, &annotated_config(600.0, 600.0));
    assert_eq!(doc.page_count(), 1);
    match &doc.pages[0].fragments[0].part {
        Part::Scaled { width, height } => {
            assert!(*height <= 560.0);
            assert!((height - 560.0).abs() < 1e-3);
            let width = width.unwrap();
            assert!((width / height - 0.5).abs() < 1e-3);
        }
        other => panic!("expected a scaled image, got {other:?}"),
    }
    assert!(doc.pages[0].content.contains("height: 560.00px"));
}

#[test]
fn image_after_text_starts_on_fresh_page() {
    let html = r#"
        <p data-height="100">Attachment follows</p>
        <p data-height="800"><img src="scan.png" data-natural-width="400" data-natural-height="800"></p>
    "#;
    let doc = paginate_annotated(html, &annotated_config(600.0, 600.0));
    assert_eq!(page_nodes(&doc), vec![vec![0], vec![1]]);
}

// =====================================================================
// Invariants
// =====================================================================

fn mixed_document() -> String {
    let mut html = paragraphs(&[120.0, 80.0]);
    html.push_str("<h3 data-height=\"30\">Breakdown</h3>");
    html.push_str(&annotated_table(30));
    html.push_str("<ol data-height=\"300\">");
    for i in 0..15 {
        html.push_str(&format!("<li data-height=\"20\">Note {i}</li>"));
    }
    html.push_str("</ol>");
    html.push_str(&paragraphs(&[60.0, 60.0]));
    html
}

#[test]
fn content_is_conserved_across_pages() {
    let config = annotated_config(250.0, 300.0);
    let measurer = AnnotatedMeasurer::strict();
    let html = mixed_document();
    let nodes = build_nodes(&html, &config.geometry, &measurer);
    let pages = paginate(&nodes, &config.geometry, &config.policy).unwrap();
    assert!(pages.len() > 2);
    let rebuilt = reconstruct(&pages, &nodes).unwrap();
    assert_eq!(rebuilt, nodes);
}

#[test]
fn page_numbers_are_sequential() {
    let doc = paginate_annotated(&mixed_document(), &annotated_config(250.0, 300.0));
    assert_pages_numbered(&doc);
}

/// A statement table with caption, padding, borders and two body sections,
/// then a long ordered list. Written without whitespace between tags so that
/// page markup can be stitched back into the exact source.
fn boxed_document() -> String {
    let mut html = String::from("<p>Account summary for the period.</p>");
    html.push_str(r#"<table class="statement" style="padding: 6px; border: 2px solid #333"><caption>Transactions</caption><thead><tr><th>Date</th><th>Amount</th></tr></thead>"#);
    for (class, rows) in [("charges", 0..35), ("payments", 35..60)] {
        html.push_str(&format!(r#"<tbody class="{class}">"#));
        for i in rows {
            html.push_str(&format!("<tr><td>{:02}/03/2026</td><td>{}.00</td></tr>", i % 28 + 1, (i + 1) * 5));
        }
        html.push_str("</tbody>");
    }
    html.push_str("<tfoot><tr><td>Balance</td><td>0.00</td></tr></tfoot></table>");
    html.push_str(r#"<ol start="3" style="padding-top: 10px; margin-bottom: 14px">"#);
    for i in 0..80 {
        html.push_str(&format!("<li>Instruction {i}: keep this notice with your records.</li>"));
    }
    html.push_str("</ol><p>Issued by the assessment office.</p>");
    html
}

#[test]
fn remeasured_fragments_fit_their_page_budget() {
    let config = PipelineConfig::default();
    let measurer = config.default_measurer().unwrap();
    let nodes = build_nodes(&boxed_document(), &config.geometry, &measurer);
    let pages = paginate(&nodes, &config.geometry, &config.policy).unwrap();
    assert!(pages.len() > 3);

    let constraints = config.geometry.constraints();
    let mut split_parts = 0;
    for page in &pages {
        let budget = config
            .geometry
            .available_height(PageClass::for_page(page.page_number))
            .unwrap();
        let mut used = 0.0;
        for fragment in &page.fragments {
            let markup = fragment.materialize(&nodes[fragment.node]);
            let actual = measurer.measure(&markup, &constraints).unwrap();
            assert!(
                (actual - fragment.height).abs() < 0.05,
                "page {}: block {} booked {} but measures {actual}",
                page.page_number,
                fragment.node,
                fragment.height
            );
            if fragment.part != Part::Whole {
                split_parts += 1;
            }
            used += actual;
        }
        assert!(used <= budget + 0.05, "page {} uses {used}px of {budget}px", page.page_number);
    }
    assert!(split_parts >= 4);
}

/// Fold a later part of a split table or list into the part before it.
fn stitch(into: &mut ElementNode, part: &ElementNode) {
    if matches!(into.tag, Tag::Ol | Tag::Ul) {
        into.children.extend(part.children.iter().cloned());
        return;
    }
    for child in &part.children {
        let DomNode::Element(section) = child else {
            continue;
        };
        match section.tag {
            Tag::Tbody | Tag::Tfoot | Tag::Tr => {}
            _ => continue,
        }
        match into.children.last_mut() {
            Some(DomNode::Element(last))
                if section.tag == Tag::Tbody && last.tag == Tag::Tbody && last.attributes == section.attributes =>
            {
                last.children.extend(section.children.iter().cloned());
            }
            _ => into.children.push(child.clone()),
        }
    }
}

#[test]
fn page_markup_stitches_back_into_the_source() {
    let config = PipelineConfig::default();
    let html = boxed_document();
    let doc = paginate_html_default(&html, &config).unwrap();
    assert!(doc.page_count() > 3);

    let mut stitched: Vec<(usize, ElementNode)> = Vec::new();
    for page in &doc.pages {
        let blocks = collect_blocks(&parse_html(&page.content));
        assert_eq!(blocks.len(), page.fragments.len(), "page {}", page.page_number);
        for (fragment, block) in page.fragments.iter().zip(blocks) {
            if let Part::Items { items } = &fragment.part {
                let expected = (items.start > 0).then(|| (3 + items.start).to_string());
                let expected = expected.as_deref().or(Some("3"));
                assert_eq!(block.attr("start"), expected);
            }
            match stitched.last_mut() {
                Some((node, whole)) if *node == fragment.node => stitch(whole, &block),
                _ => stitched.push((fragment.node, block)),
            }
        }
    }
    let rebuilt: String = stitched.iter().map(|(_, e)| e.to_html()).collect();
    assert_eq!(rebuilt, html);

    let again = paginate_html_default(&rebuilt, &config).unwrap();
    assert_eq!(again.pages, doc.pages);
}

#[test]
fn source_markup_is_not_mutated() {
    let html = mixed_document();
    let config = annotated_config(250.0, 300.0);
    let nodes = build_nodes(&html, &config.geometry, &AnnotatedMeasurer::strict());
    let before = nodes.clone();
    let _ = paginate(&nodes, &config.geometry, &config.policy).unwrap();
    assert_eq!(nodes, before);
}

// =====================================================================
// Configuration errors
// =====================================================================

#[test]
fn header_taller_than_page_is_rejected() {
    let config = PipelineConfig {
        geometry: Geometry {
            continuation_header_height: 2000.0,
            ..Geometry::a4_notice()
        },
        ..PipelineConfig::default()
    };
    let err = paginate_html_default("<p>x</p>", &config).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn out_of_range_policy_is_rejected() {
    let config = PipelineConfig {
        policy: PaginationPolicy {
            page_bottom_threshold: 1.5,
            ..PaginationPolicy::default()
        },
        ..PipelineConfig::default()
    };
    assert!(paginate_html_default("<p>x</p>", &config).is_err());
}

// =====================================================================
// Templates with text metrics
// =====================================================================

#[test]
fn notice_letter_fits_one_page() {
    let doc = paginate_html_default(templates::notice_letter_template(), &PipelineConfig::default()).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert!(doc.pages[0].content.contains("Notice of Assessment"));
}

#[test]
fn long_ordered_steps_are_renumbered() {
    let html = templates::ordered_steps_template(80);
    let doc = paginate_html_default(&html, &PipelineConfig::default()).unwrap();
    assert!(doc.page_count() > 1);
    for page in &doc.pages[1..] {
        if page.content.starts_with("<ol") {
            assert!(page.content.contains("start=\""));
        }
    }
    let all: String = doc.pages.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(all.matches("<li>").count(), 80);
}

#[test]
fn oversized_scan_template_is_scaled() {
    let doc = paginate_html_default(templates::oversized_image_template(), &PipelineConfig::default()).unwrap();
    let scaled = doc
        .pages
        .iter()
        .flat_map(|p| &p.fragments)
        .any(|f| matches!(f.part, Part::Scaled { .. }));
    assert!(scaled);
}

#[test]
fn every_block_kind_is_paginated() {
    let dom = parse_html(templates::all_elements_template());
    assert!(!dom.is_empty());
    let doc = paginate_html_default(templates::all_elements_template(), &PipelineConfig::default()).unwrap();
    let all: String = doc.pages.iter().map(|p| p.content.as_str()).collect();
    for needle in ["S1234567A", "Heading 3", "<ul>", "<ol start=\"3\">", "<table>", "<hr>", "seal.png", "Quoted remark."] {
        assert!(all.contains(needle), "missing {needle}");
    }
}

// =====================================================================
// JSON and rendering
// =====================================================================

#[test]
fn paginated_document_json_roundtrip() {
    let doc = paginate_annotated(&mixed_document(), &annotated_config(250.0, 300.0));
    let json = doc.to_json().unwrap();
    let parsed = PaginatedDocument::from_json(&json).unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn print_html_has_letterhead_and_page_footers() {
    let config = PipelineConfig {
        title: "Demand Note".to_string(),
        letterhead: Some(Letterhead {
            reference: "S1234567A".to_string(),
            date: "19 Oct 2026".to_string(),
            recipient_name: "Tan Ah Kow".to_string(),
            recipient_address: vec!["1 Example Road".to_string(), "Singapore 123456".to_string()],
            ..Letterhead::default()
        }),
        footer_links: vec![FooterLink {
            label: "Website".to_string(),
            text: "www.example.gov".to_string(),
            url: "https://www.example.gov".to_string(),
        }],
        ..PipelineConfig::default()
    };
    let (print, doc) = generate_print_html(&templates::long_table_template(120), &config).unwrap();
    let total = doc.page_count();
    assert!(total > 1);
    assert!(print.contains("<title>Demand Note</title>"));
    assert_eq!(print.matches("class=\"print-page\"").count(), total);
    assert_eq!(print.matches("<header class=\"letterhead\">").count(), 1);
    assert_eq!(print.matches("<header class=\"letterhead-continuation\">").count(), total - 1);
    assert!(print.contains("Tan Ah Kow"));
    assert!(print.contains(&format!("Page {total} of {total}")));
    assert!(print.contains("https://www.example.gov"));
}

#[test]
fn print_output_is_deterministic() {
    let html = templates::long_table_template(60);
    let (first, _) = generate_print_html(&html, &PipelineConfig::default()).unwrap();
    let (second, _) = generate_print_html(&html, &PipelineConfig::default()).unwrap();
    assert_eq!(sha256_hex(&first), sha256_hex(&second));
    assert_eq!(sha256_hex(&first).len(), 64);
}
