//! The full report page: header, upload form, and the mounted sections.

use crate::html::{
    escape, render_financial_table, render_quality, render_snapshot, render_sources,
    render_trends, render_verdict,
};
use crate::sections::ReportView;

/// State of the upload form as the page should show it.
#[derive(Debug, Clone, Default)]
pub struct UploadForm<'a> {
    /// A call is in flight: the submit control is disabled.
    pub pending: bool,
    /// File currently being analysed, if any.
    pub pending_file: Option<&'a str>,
    /// Inline validation or analysis failure message.
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct PageContext<'a> {
    /// Present once an analysis has succeeded; hides the upload form.
    pub report: Option<&'a ReportView>,
    /// Name of the PDF the current report was built from.
    pub file_name: Option<&'a str>,
    pub upload: UploadForm<'a>,
}

const STYLE: &str = r#"
*{box-sizing:border-box}
body{margin:0;font-family:system-ui,-apple-system,"Segoe UI",Roboto,sans-serif;background:#f3f4f6;color:#111827}
header,footer{background:#fff;border-bottom:1px solid #d1d5db}
footer{border-top:1px solid #d1d5db;border-bottom:none;margin-top:40px;min-height:48px}
.bar{max-width:64rem;margin:0 auto;padding:16px 24px;display:flex;align-items:center;justify-content:space-between}
h1{font-size:1rem;font-weight:600;margin:0}
h2{font-size:1.125rem;font-weight:600;margin:0 0 16px}
h3{font-size:.875rem;font-weight:600;margin:0 0 8px}
main{max-width:64rem;margin:0 auto;padding:32px 24px;display:flex;flex-direction:column;gap:24px}
.card{width:100%;max-width:56rem;margin:0 auto;padding:24px;border-radius:8px;border:1px solid #d1d5db;background:#fff}
.current{font-size:.75rem;color:#374151;display:flex;align-items:center;gap:12px}
.current .name{font-weight:500;color:#111827;max-width:240px;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
button,.button{padding:8px 16px;border-radius:6px;border:1px solid #9ca3af;background:#111827;color:#fff;font-size:.875rem;cursor:pointer}
button:disabled{opacity:.6;cursor:wait}
.reset button{padding:4px 8px;background:#fff;color:#111827;font-size:.75rem}
form.card{max-width:42rem;display:flex;flex-direction:column;gap:16px}
.error{color:#dc2626;font-size:.875rem;margin:0}
.pending{color:#4b5563;font-size:.75rem;margin:0}
.empty{display:flex;align-items:center;justify-content:center;height:50vh;font-size:.875rem;color:#6b7280}
.grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(240px,1fr));gap:16px;font-size:.875rem}
.label{color:#6b7280;display:flex;align-items:center;gap:4px}
.value{font-weight:500}
.note{margin:12px 0 0;font-size:.75rem;color:#6b7280}
.scroll{overflow-x:auto}
table{width:100%;font-size:.875rem;border-collapse:collapse}
th{text-align:left;color:#4b5563;border-bottom:1px solid #e5e7eb;padding:8px 16px 8px 0}
td{border-bottom:1px solid #f3f4f6;padding:8px 16px 8px 0}
td.fy{font-weight:500}
.charts{display:grid;grid-template-columns:repeat(auto-fit,minmax(200px,1fr));gap:16px}
.chart{display:flex;flex-direction:column;gap:8px}
.caption{font-size:.75rem;color:#4b5563}
.tip{position:relative;display:inline-flex;align-items:center;justify-content:center;width:16px;height:16px;border-radius:50%;border:1px solid #9ca3af;font-size:10px;color:#374151;background:#fff;cursor:help}
.tip-body{display:none;position:absolute;left:0;top:100%;margin-top:8px;z-index:10;width:16rem;padding:8px;font-size:.75rem;border-radius:6px;border:1px solid #d1d5db;background:#fff;color:#1f2937;font-weight:400}
.tip-body strong{display:block;margin-bottom:4px;color:#111827}
.tip:hover .tip-body,.tip:focus .tip-body{display:block}
.verdict .row{display:flex;align-items:center;gap:24px;font-size:.875rem;margin-bottom:8px}
.verdict .strong{font-weight:500}
.verdict .small{font-size:.75rem;opacity:.8}
.verdict ul{padding-left:20px;opacity:.9;font-size:.875rem}
.verdict p{opacity:.9;font-size:.875rem}
.badge{padding:2px 8px;border-radius:6px;border:1px solid currentColor;font-size:.75rem;text-transform:uppercase;letter-spacing:.05em}
.tone-strong{background:#111827;color:#fff;border-color:#111827}
.tone-muted{background:#374151;color:#fff;border-color:#374151}
.tone-outline{background:#fff;color:#111827;border-color:#9ca3af}
.sources{max-width:56rem;margin:0 auto;width:100%;font-size:.75rem;color:#4b5563}
"#;

fn render_header(ctx: &PageContext<'_>) -> String {
    let mut out = String::from(r#"<header><div class="bar"><h1>IPO Scorecard</h1>"#);
    if ctx.report.is_some() {
        let name = ctx.file_name.map(escape).unwrap_or_else(|| "—".to_string());
        out.push_str(&format!(
            r#"<div class="current"><span>Current PDF: <span class="name" title="{name}">{name}</span></span><form class="reset" method="post" action="/reset"><button type="submit">Upload another PDF</button></form></div>"#
        ));
    }
    out.push_str("</div></header>");
    out
}

fn render_upload_form(form: &UploadForm<'_>) -> String {
    let mut out = String::from(
        r#"<form class="card" method="post" action="/analyze" enctype="multipart/form-data"><label for="file" class="label">Upload IPO PDF (DRHP/RHP)</label><input id="file" type="file" name="file" accept="application/pdf">"#,
    );
    if form.pending {
        out.push_str(r#"<button type="submit" disabled>Analyzing…</button>"#);
        if let Some(name) = form.pending_file {
            out.push_str(&format!(r#"<p class="pending">Analyzing {}</p>"#, escape(name)));
        }
    } else {
        out.push_str(r#"<button type="submit">Analyze PDF</button>"#);
    }
    if let Some(err) = form.error {
        out.push_str(&format!(r#"<p class="error" role="alert">{}</p>"#, escape(err)));
    }
    out.push_str("</form>");
    out
}

/// Sections in fixed order; each only when present.
pub fn render_report(report: &ReportView) -> String {
    let mut out = String::new();
    if let Some(s) = &report.snapshot {
        out.push_str(&render_snapshot(s));
    }
    if let Some(t) = &report.financials {
        out.push_str(&render_financial_table(t));
    }
    if let Some(t) = &report.trends {
        out.push_str(&render_trends(t));
    }
    if let Some(q) = &report.quality {
        out.push_str(&render_quality(q));
    }
    if let Some(v) = &report.verdict {
        out.push_str(&render_verdict(v));
    }
    if !report.sources.is_empty() {
        out.push_str(&render_sources(&report.sources));
    }
    out
}

pub fn render_page(ctx: &PageContext<'_>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str(r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">"#);
    if ctx.upload.pending {
        // Other tabs pick up the result without a manual reload.
        out.push_str(r#"<meta http-equiv="refresh" content="5">"#);
    }
    out.push_str("<title>IPO Scorecard</title><style>");
    out.push_str(STYLE);
    out.push_str("</style></head><body>");
    out.push_str(&render_header(ctx));
    out.push_str("<main>");

    match ctx.report {
        Some(report) => out.push_str(&render_report(report)),
        None => {
            out.push_str(&render_upload_form(&ctx.upload));
            out.push_str(r#"<section class="empty">Upload a DRHP/RHP PDF to get started.</section>"#);
        }
    }

    out.push_str(r#"</main><footer><div class="bar"></div></footer></body></html>"#);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecard_core::AnalyzeResponse;
    use serde_json::json;

    fn view(value: serde_json::Value) -> ReportView {
        let resp: AnalyzeResponse = serde_json::from_value(value).unwrap();
        ReportView::build(&resp)
    }

    #[test]
    fn test_empty_state_shows_form_and_prompt() {
        let html = render_page(&PageContext::default());
        assert!(html.contains(r#"action="/analyze""#));
        assert!(html.contains("<button type=\"submit\">Analyze PDF</button>"));
        assert!(html.contains("Upload a DRHP/RHP PDF to get started."));
        assert!(!html.contains("Upload another PDF"));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_pending_disables_submit() {
        let ctx = PageContext {
            upload: UploadForm { pending: true, pending_file: Some("acme.pdf"), error: None },
            ..Default::default()
        };
        let html = render_page(&ctx);
        assert!(html.contains("<button type=\"submit\" disabled>Analyzing…</button>"));
        assert!(html.contains("Analyzing acme.pdf"));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_error_is_inline_and_form_stays_usable() {
        let ctx = PageContext {
            upload: UploadForm { pending: false, pending_file: None, error: Some("Upload failed") },
            ..Default::default()
        };
        let html = render_page(&ctx);
        assert!(html.contains(r#"<p class="error" role="alert">Upload failed</p>"#));
        assert!(html.contains("<button type=\"submit\">Analyze PDF</button>"));
    }

    #[test]
    fn test_terms_only_report_mounts_three_sections() {
        let report = view(json!({
            "components": [{
                "component": "terms_and_financials",
                "company": "Acme <Ltd>",
                "terms": {},
                "financials": [{ "fy": "FY24", "revenue_cr": 10.0 }]
            }]
        }));
        let ctx = PageContext { report: Some(&report), file_name: Some("acme.pdf"), ..Default::default() };
        let html = render_page(&ctx);

        assert!(html.contains(r#"id="snapshot""#));
        assert!(html.contains(r#"id="financials""#));
        assert!(html.contains(r#"id="trends""#));
        assert!(!html.contains(r#"id="quality""#));
        assert!(!html.contains(r#"id="verdict""#));
        assert!(html.contains("Acme &lt;Ltd&gt;"));
        assert!(html.contains("Upload another PDF"));
        assert!(html.contains("acme.pdf"));
        assert!(!html.contains(r#"action="/analyze""#));
    }

    #[test]
    fn test_sections_render_in_fixed_order() {
        let report = view(json!({
            "components": [
                { "component": "verdict", "verdict": "Neutral", "confidence": 0.6 },
                { "component": "financial_quality", "metrics": {} },
                { "component": "terms_and_financials", "terms": {}, "financials": [{ "fy": "FY24" }] }
            ]
        }));
        let html = render_report(&report);
        let pos = |id: &str| html.find(&format!(r#"id="{id}""#)).unwrap();
        assert!(pos("snapshot") < pos("financials"));
        assert!(pos("financials") < pos("trends"));
        assert!(pos("trends") < pos("quality"));
        assert!(pos("quality") < pos("verdict"));
    }
}
