//! Sample notice bodies for testing and demonstration.
//!
//! Each template exercises a different pagination path: long tables, long
//! ordered lists, forced breaks and oversized images.

/// A short single-page notice letter.
pub fn notice_letter_template() -> &'static str {
    r##"
<p>Dear Sir/Madam,</p>
<h2>Notice of Assessment for Year of Assessment 2026</h2>
<p>We have assessed your income for the year ended 31 December 2025 based on the
information you declared. The details of the assessment are set out below.</p>
<table class="assessment">
    <thead>
        <tr><th>Item</th><th>Amount (S$)</th></tr>
    </thead>
    <tbody>
        <tr><td>Employment income</td><td>84,000.00</td></tr>
        <tr><td>Less: Reliefs</td><td>(12,500.00)</td></tr>
        <tr><td>Chargeable income</td><td>71,500.00</td></tr>
    </tbody>
    <tfoot>
        <tr><td>Tax payable</td><td>3,245.00</td></tr>
    </tfoot>
</table>
<p>Please pay the tax by <strong>30 November 2026</strong>. If you disagree with
this assessment, you may file an objection within 30 days.</p>
<p>Yours faithfully,<br>Comptroller of Income Tax</p>
"##
}

/// A notice with a long statement-of-account table (header and footer
/// groups) that spans several pages.
pub fn long_table_template(rows: usize) -> String {
    let mut html = String::from(
        "<h2>Statement of Account</h2>\n<p>The following transactions were recorded on your account.</p>\n",
    );
    html.push_str("<table class=\"statement\">\n<thead><tr><th>Date</th><th>Description</th><th>Amount</th></tr></thead>\n<tbody>\n");
    for i in 0..rows {
        html.push_str(&format!(
            "<tr><td>{:02}/01/2026</td><td>Transaction {}</td><td>{}.00</td></tr>\n",
            i % 28 + 1,
            i + 1,
            (i + 1) * 10
        ));
    }
    html.push_str("</tbody>\n<tfoot><tr><td colspan=\"2\">Balance</td><td>0.00</td></tr></tfoot>\n</table>\n");
    html.push_str("<p>Please contact us if any transaction is not recognised.</p>\n");
    html
}

/// Numbered instructions long enough to continue over several pages.
pub fn ordered_steps_template(steps: usize) -> String {
    let mut html = String::from("<h3>How to file an objection</h3>\n<ol class=\"steps\">\n");
    for i in 1..=steps {
        html.push_str(&format!(
            "<li>Step {i}: review the relevant section of your assessment and prepare supporting documents before proceeding.</li>\n"
        ));
    }
    html.push_str("</ol>\n");
    html
}

/// Content separated by the editor's page-break component.
pub fn page_break_template() -> &'static str {
    r##"
<h2>Part A: Summary</h2>
<p>This part summarises the notice.</p>
<div class="page-break"></div>
<h2>Part B: Details</h2>
<p style="page-break-after: always">This part sets out the detailed computation.</p>
<h2>Part C: Appendix</h2>
<p>Supporting schedules follow.</p>
"##
}

/// An attachment scan taller than any page.
pub fn oversized_image_template() -> &'static str {
    r##"
<p>The scanned supporting document is attached below.</p>
<p><img src="scan-001.png" data-natural-width="1240" data-natural-height="3508" alt="Scan"></p>
<p>End of attachment.</p>
"##
}

/// Smallest possible body.
pub fn minimal_template() -> &'static str {
    "<p>Hello, world!</p>"
}

/// One of every supported block kind, with loose inline text.
pub fn all_elements_template() -> &'static str {
    r##"
Reference: <strong>S1234567A</strong>
<h1>Heading 1</h1>
<h2>Heading 2</h2>
<h3>Heading 3</h3>
<p>Paragraph with <b>bold</b>, <em>italic</em> and <span style="font-size: 14px">sized</span> text.</p>
<div style="margin: 8px; padding: 4px">A styled division.</div>
<ul><li>Bullet one</li><li>Bullet two</li></ul>
<ol start="3"><li>Third</li><li>Fourth</li></ol>
<table>
    <tr><th>Key</th><th>Value</th></tr>
    <tr><td>Alpha</td><td>1</td></tr>
</table>
<hr>
<figure><img src="seal.png" style="width: 64px; height: 64px"></figure>
<blockquote>Quoted remark.</blockquote>
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn templates_parse_to_nodes() {
        let owned = [long_table_template(5), ordered_steps_template(5)];
        let fixed = [
            notice_letter_template(),
            page_break_template(),
            oversized_image_template(),
            minimal_template(),
            all_elements_template(),
        ];
        for html in owned.iter().map(String::as_str).chain(fixed) {
            assert!(!parse_html(html).is_empty());
        }
    }
}
