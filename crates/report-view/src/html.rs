//! HTML fragments for each report section.
//!
//! Every string that originates from the analysis service goes through
//! [`escape`]. Labels and help texts are static.

use crate::chart::render_mini_line_chart;
use crate::sections::{
    Field, FinancialTable, QualitySection, SnapshotSection, SourceLink, TrendsSection,
    VerdictSection,
};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn info_tip(label: &str, help: &str) -> String {
    format!(
        r#"<span class="tip" tabindex="0" aria-label="{label}">i<span class="tip-body"><strong>{label}</strong>{help}</span></span>"#,
        label = escape(label),
        help = escape(help),
    )
}

fn field_grid(fields: &[Field]) -> String {
    let mut out = String::from(r#"<div class="grid">"#);
    for f in fields {
        let tip = f.help.map(|h| info_tip(f.label, h)).unwrap_or_default();
        out.push_str(&format!(
            r#"<div><div class="label">{} {}</div><div class="value">{}</div></div>"#,
            escape(f.label),
            tip,
            escape(&f.value)
        ));
    }
    out.push_str("</div>");
    out
}

pub fn render_snapshot(section: &SnapshotSection) -> String {
    format!(
        r#"<section class="card" id="snapshot"><h2>IPO Snapshot</h2>{}</section>"#,
        field_grid(&section.fields)
    )
}

pub fn render_financial_table(table: &FinancialTable) -> String {
    let mut out = String::from(
        r#"<section class="card" id="financials"><h2>Financial Summary (₹ crore)</h2><div class="scroll"><table><thead><tr>"#,
    );
    for col in &table.columns {
        out.push_str(&format!("<th>{}</th>", escape(col)));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str(&format!(r#"<tr><td class="fy">{}</td>"#, escape(&row.fy)));
        for cell in &row.cells {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
    out.push_str(r#"<p class="note">Numbers normalized to ₹ crore with 2 decimals where available.</p></section>"#);
    out
}

pub fn render_trends(section: &TrendsSection) -> String {
    let mut out = String::from(r#"<section class="card" id="trends"><h2>Trends</h2><div class="charts">"#);
    for chart in &section.charts {
        out.push_str(&format!(
            r#"<div class="chart"><div class="label">{}</div>{}<div class="caption">Latest: <span class="value">{}</span></div></div>"#,
            escape(chart.label),
            render_mini_line_chart(&chart.layout),
            escape(&chart.latest)
        ));
    }
    out.push_str("</div>");
    out.push_str(r#"<p class="note">Each chart shows the trend across reported years; a missing year is drawn at mid-height.</p></section>"#);
    out
}

pub fn render_quality(section: &QualitySection) -> String {
    format!(
        r#"<section class="card" id="quality"><h2>Financial Quality</h2>{}<p class="note">Higher growth and margins are better. Positive and consistent cash flows strengthen conviction; lower leverage is safer.</p></section>"#,
        field_grid(&section.fields)
    )
}

pub fn render_verdict(section: &VerdictSection) -> String {
    let mut out = format!(
        r#"<section class="card verdict {}" id="verdict"><h2>Verdict</h2>"#,
        section.tone.css_class()
    );
    out.push_str(&format!(
        r#"<div class="row"><span class="strong">Recommendation:</span><span class="badge">{}</span></div>"#,
        escape(section.verdict.label())
    ));
    out.push_str(&format!(
        r#"<div class="row"><div><div class="small">Score</div><div class="value">{}</div></div><div><div class="small">Confidence</div><div class="value">{}</div></div></div>"#,
        escape(&section.score),
        escape(&section.confidence)
    ));
    if let Some(prose) = &section.plain_english {
        out.push_str(&format!("<p>{}</p>", escape(prose)));
    }
    if !section.reasons.is_empty() {
        out.push_str("<ul>");
        for reason in &section.reasons {
            out.push_str(&format!("<li>{}</li>", escape(reason)));
        }
        out.push_str("</ul>");
    }
    out.push_str("</section>");
    out
}

/// Source links are only rendered as anchors for http(s) URLs.
pub fn render_sources(sources: &[SourceLink]) -> String {
    let mut out = String::from(r#"<section class="sources"><h3>Sources</h3><ul>"#);
    for s in sources {
        match s.url.as_deref().filter(|u| u.starts_with("http://") || u.starts_with("https://")) {
            Some(url) => out.push_str(&format!(
                r#"<li><a href="{}" rel="noopener noreferrer">{}</a></li>"#,
                escape(url),
                escape(&s.title)
            )),
            None => out.push_str(&format!("<li>{}</li>", escape(&s.title))),
        }
    }
    out.push_str("</ul></section>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Tone;
    use scorecard_core::Verdict;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"A&B's"</b>"#), "&lt;b&gt;&quot;A&amp;B&#x27;s&quot;&lt;/b&gt;");
        assert_eq!(escape("₹ crore"), "₹ crore");
    }

    #[test]
    fn test_verdict_html_escapes_service_text() {
        let section = VerdictSection {
            verdict: Verdict::Neutral,
            tone: Tone::Muted,
            score: "—".into(),
            confidence: "55%".into(),
            plain_english: Some("<script>alert(1)</script>".into()),
            reasons: vec!["Margins & growth mixed".into()],
        };
        let html = render_verdict(&section);
        assert!(html.contains("tone-muted"));
        assert!(html.contains(">Neutral<"));
        assert!(html.contains("55%"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<li>Margins &amp; growth mixed</li>"));
    }

    #[test]
    fn test_verdict_without_reasons_has_no_list() {
        let section = VerdictSection {
            verdict: Verdict::Apply,
            tone: Tone::Strong,
            score: "80".into(),
            confidence: "90%".into(),
            plain_english: None,
            reasons: vec![],
        };
        let html = render_verdict(&section);
        assert!(!html.contains("<ul>"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_sources_only_link_http() {
        let html = render_sources(&[
            SourceLink { title: "Uploaded PDF".into(), url: Some("uploads/abc.pdf".into()) },
            SourceLink { title: "SEBI filing".into(), url: Some("https://www.sebi.gov.in/x".into()) },
            SourceLink { title: "Bad".into(), url: Some("javascript:alert(1)".into()) },
        ]);
        assert!(html.contains("<li>Uploaded PDF</li>"));
        assert!(html.contains(r#"<a href="https://www.sebi.gov.in/x""#));
        assert!(!html.contains("javascript:"));
    }
}
