//! Display sections of the IPO report.
//!
//! [`ReportView::build`] resolves each block from the response and formats
//! every value up front. A section is `None` when its backing block is
//! missing; that is a normal outcome, not an error.

use serde::Serialize;

use scorecard_core::format::{
    format_confidence, format_currency_crore, format_date, format_integer, format_percent,
    format_price_band, format_ratio, format_score, format_text, format_whole_percent,
};
use scorecard_core::series::{latest, ChartLayout, DEFAULT_CHART_HEIGHT};
use scorecard_core::{
    financial_quality, terms_and_financials, verdict, AnalyzeResponse, FinancialField,
    FinancialRow, Metrics, TermsAndFinancialsBlock, Verdict, VerdictBlock,
};

/// A labelled value, optionally with a short explanation for the reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

impl Field {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value, help: None }
    }

    fn with_help(label: &'static str, value: String, help: &'static str) -> Self {
        Self { label, value, help: Some(help) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSection {
    pub fields: Vec<Field>,
}

impl SnapshotSection {
    pub fn build(block: &TermsAndFinancialsBlock) -> Self {
        let terms = &block.terms;
        Self {
            fields: vec![
                Field::new("Company", format_text(block.company.as_deref())),
                Field::new("Price Band", format_price_band(terms.price_band.as_ref())),
                Field::new("Lot Size (shares)", format_integer(terms.lot_size.map(|n| n as f64))),
                Field::new("Open Date", format_date(terms.open_date.as_ref())),
                Field::new("Close Date", format_date(terms.close_date.as_ref())),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub fy: String,
    pub cells: Vec<String>,
}

/// Year-by-year financial summary in ₹ crore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

impl FinancialTable {
    pub fn build(rows: &[FinancialRow]) -> Self {
        let mut columns = vec!["FY"];
        columns.extend(FinancialField::ALL.iter().map(|f| f.label()));

        let rows = rows
            .iter()
            .map(|row| TableRow {
                fy: format_text(row.fy.as_deref()),
                cells: FinancialField::ALL
                    .iter()
                    .map(|f| format_currency_crore(f.value(row)))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub label: &'static str,
    pub layout: ChartLayout,
    pub latest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsSection {
    pub charts: Vec<TrendChart>,
}

const TREND_FIELDS: [(FinancialField, &str); 3] = [
    (FinancialField::Revenue, "Revenue (₹ cr)"),
    (FinancialField::Ebitda, "EBITDA (₹ cr)"),
    (FinancialField::Pat, "PAT (₹ cr)"),
];

impl TrendsSection {
    pub fn build(rows: &[FinancialRow]) -> Self {
        let charts = TREND_FIELDS
            .iter()
            .map(|&(field, label)| {
                let samples = field.column(rows);
                TrendChart {
                    label,
                    layout: ChartLayout::compute(&samples, DEFAULT_CHART_HEIGHT),
                    latest: format_currency_crore(latest(&samples)),
                }
            })
            .collect();
        Self { charts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySection {
    pub fields: Vec<Field>,
}

impl QualitySection {
    pub fn build(m: &Metrics) -> Self {
        // A zero-year window means the service had nothing to measure.
        let window = format_integer(m.window_years.filter(|y| *y > 0).map(|y| y as f64));

        Self {
            fields: vec![
                Field::new("Window (years)", window),
                Field::with_help(
                    "Revenue CAGR",
                    format_percent(m.revenue_cagr),
                    "Average annual growth in revenue across the reported years.",
                ),
                Field::with_help(
                    "PAT CAGR",
                    format_percent(m.pat_cagr),
                    "Average annual growth in profit after tax.",
                ),
                Field::with_help(
                    "EBITDA CAGR",
                    format_percent(m.ebitda_cagr),
                    "Average annual growth in operating profit before depreciation and interest.",
                ),
                Field::with_help(
                    "PAT Margin (latest)",
                    format_percent(m.pat_margin),
                    "Profit after tax as a share of revenue in the latest year.",
                ),
                Field::with_help(
                    "EBITDA Margin (latest)",
                    format_percent(m.ebitda_margin),
                    "Operating profit as a share of revenue in the latest year.",
                ),
                Field::with_help(
                    "EBITDA Margin Trend",
                    format_percent(m.margin_trend_ebitda),
                    "Change in EBITDA margin from first to last reported year.",
                ),
                Field::with_help(
                    "Revenue Volatility",
                    format_percent(m.revenue_volatility),
                    "How bumpy revenue growth is year to year (lower is steadier).",
                ),
                Field::with_help(
                    "Debt / Net Worth",
                    format_ratio(m.debt_to_networth),
                    "Higher values mean more borrowing compared to equity.",
                ),
                Field::with_help(
                    "Net Debt / EBITDA",
                    format_ratio(m.net_debt_to_ebitda),
                    "How many years of operating profit to repay net debt (lower is better).",
                ),
                Field::with_help(
                    "CFO (latest)",
                    format_currency_crore(m.cfo_latest),
                    "Cash generated from core business in the latest year.",
                ),
                Field::with_help(
                    "CFO / PAT",
                    format_percent(m.cfo_to_pat),
                    "How much profit converts to cash (closer to 100% is better).",
                ),
                Field::with_help(
                    "Years with +CFO",
                    format_whole_percent(m.cfo_positive_years_ratio),
                    "Share of reported years with positive cash flow from operations.",
                ),
            ],
        }
    }
}

/// Visual emphasis of the verdict card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Dark, filled card.
    Strong,
    /// Mid-grey filled card.
    Muted,
    /// Plain card with a neutral border; least emphasis.
    Outline,
}

impl Tone {
    pub fn for_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Apply => Tone::Strong,
            Verdict::Neutral => Tone::Muted,
            Verdict::Avoid => Tone::Outline,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Strong => "tone-strong",
            Tone::Muted => "tone-muted",
            Tone::Outline => "tone-outline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictSection {
    pub verdict: Verdict,
    pub tone: Tone,
    pub score: String,
    pub confidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_english: Option<String>,
    pub reasons: Vec<String>,
}

impl VerdictSection {
    pub fn build(block: &VerdictBlock) -> Self {
        Self {
            verdict: block.verdict,
            tone: Tone::for_verdict(block.verdict),
            score: format_score(block.score),
            confidence: format_confidence(block.confidence),
            plain_english: block
                .plain_english
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            reasons: block.why.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLink {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Everything the report page shows for one analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub snapshot: Option<SnapshotSection>,
    pub financials: Option<FinancialTable>,
    pub trends: Option<TrendsSection>,
    pub quality: Option<QualitySection>,
    pub verdict: Option<VerdictSection>,
    pub sources: Vec<SourceLink>,
}

impl ReportView {
    pub fn build(response: &AnalyzeResponse) -> Self {
        let taf = terms_and_financials(response);
        let rows = taf.map(|b| b.financials.as_slice()).filter(|rows| !rows.is_empty());

        Self {
            slug: response.slug.clone(),
            snapshot: taf.map(SnapshotSection::build),
            financials: rows.map(FinancialTable::build),
            trends: rows.map(TrendsSection::build),
            quality: financial_quality(response).map(|fq| QualitySection::build(&fq.metrics)),
            verdict: verdict(response).map(VerdictSection::build),
            sources: response
                .sources
                .iter()
                .map(|s| SourceLink { title: s.title.clone(), url: s.url.clone() })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
            && self.financials.is_none()
            && self.trends.is_none()
            && self.quality.is_none()
            && self.verdict.is_none()
    }
}
