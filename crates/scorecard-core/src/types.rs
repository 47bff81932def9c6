use serde::{Deserialize, Serialize};

use crate::ScorecardError;

/// Full payload returned by the analysis service for one uploaded prospectus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub slug: Option<String>,
    /// Display order, as sent by the service.
    #[serde(default)]
    pub components: Vec<Block>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl AnalyzeResponse {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ScorecardError> {
        serde_json::from_slice(bytes).map_err(|e| ScorecardError::InvalidResponse(e.to_string()))
    }
}

/// Where the analysis came from (the uploaded PDF, filings, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One result block, discriminated by its `component` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Block {
    TermsAndFinancials(TermsAndFinancialsBlock),
    FinancialQuality(FinancialQualityBlock),
    Verdict(VerdictBlock),
    /// A tag this build does not know how to display.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermsAndFinancialsBlock {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub terms: Terms,
    #[serde(default)]
    pub financials: Vec<FinancialRow>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialQualityBlock {
    #[serde(default)]
    pub metrics: Metrics,
    /// Carried through untouched; nothing renders it yet.
    #[serde(default)]
    pub valuation: serde_json::Value,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Offer terms from the prospectus cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Terms {
    #[serde(default, deserialize_with = "lenient::price_band")]
    pub price_band: Option<PriceBand>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub lot_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub open_date: Option<DateValue>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub close_date: Option<DateValue>,
}

/// Issue price range in rupees per share, `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "[f64; 2]")]
pub struct PriceBand {
    pub low: f64,
    pub high: f64,
}

impl PriceBand {
    /// Orders the bounds so `low <= high` holds.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.low == self.high
    }
}

impl From<PriceBand> for [f64; 2] {
    fn from(band: PriceBand) -> Self {
        [band.low, band.high]
    }
}

/// A calendar date as sent by the service: either an ISO-like string or an
/// epoch timestamp in milliseconds. Parsing happens at format time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Text(String),
    Timestamp(i64),
}

/// One fiscal year of headline financials, all amounts in ₹ crore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRow {
    #[serde(default)]
    pub fy: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub revenue_cr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ebitda_cr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pat_cr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub networth_cr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub debt_cr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cfo_cr: Option<f64>,
}

/// Column selector over [`FinancialRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialField {
    Revenue,
    Ebitda,
    Pat,
    NetWorth,
    Debt,
    Cfo,
}

impl FinancialField {
    pub const ALL: [FinancialField; 6] = [
        FinancialField::Revenue,
        FinancialField::Ebitda,
        FinancialField::Pat,
        FinancialField::NetWorth,
        FinancialField::Debt,
        FinancialField::Cfo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FinancialField::Revenue => "Revenue",
            FinancialField::Ebitda => "EBITDA",
            FinancialField::Pat => "PAT",
            FinancialField::NetWorth => "Net Worth",
            FinancialField::Debt => "Debt",
            FinancialField::Cfo => "CFO",
        }
    }

    pub fn value(&self, row: &FinancialRow) -> Option<f64> {
        match self {
            FinancialField::Revenue => row.revenue_cr,
            FinancialField::Ebitda => row.ebitda_cr,
            FinancialField::Pat => row.pat_cr,
            FinancialField::NetWorth => row.networth_cr,
            FinancialField::Debt => row.debt_cr,
            FinancialField::Cfo => row.cfo_cr,
        }
    }

    /// The field across all rows, in row order, gaps kept as `None`.
    pub fn column(&self, rows: &[FinancialRow]) -> Vec<Option<f64>> {
        rows.iter().map(|r| self.value(r)).collect()
    }
}

/// Pre-computed quality metrics. Fractions are 0.0–1.0 (0.123 = 12.3%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient::count")]
    pub window_years: Option<u64>,
    #[serde(default, alias = "revenue_cagr_3y", deserialize_with = "lenient::number")]
    pub revenue_cagr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pat_cagr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ebitda_cagr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pat_margin: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ebitda_margin: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub margin_trend_ebitda: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub revenue_volatility: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub debt_to_networth: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub net_debt_to_ebitda: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cfo_latest: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cfo_to_pat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cfo_positive_years_ratio: Option<f64>,
}

/// Recommendation label. Closed set: anything else is a malformed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Apply,
    Neutral,
    Avoid,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Apply => "Apply",
            Verdict::Neutral => "Neutral",
            Verdict::Avoid => "Avoid",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictBlock {
    pub verdict: Verdict,
    /// Decision score (0–100). Not every service build sends it.
    #[serde(default, deserialize_with = "lenient::number")]
    pub score: Option<f64>,
    /// 0.0 to 1.0; clamped when displayed.
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub plain_english: Option<String>,
    #[serde(default)]
    pub why: Vec<String>,
}

/// Field decoders that absorb noisy values instead of failing the response.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{DateValue, PriceBand};

    pub(super) fn as_number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|v| v.is_finite())
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(as_number(&value)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
            .map(|v| v as u64))
    }

    pub fn price_band<'de, D>(deserializer: D) -> Result<Option<PriceBand>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let band = match &value {
            // One entry is a fixed price; a pair needs both bounds.
            Value::Array(items) => match items.as_slice() {
                [single] => as_number(single).map(|v| PriceBand::new(v, v)),
                [low, high, ..] => match (as_number(low), as_number(high)) {
                    (Some(low), Some(high)) => Some(PriceBand::new(low, high)),
                    _ => None,
                },
                [] => None,
            },
            other => as_number(other).map(|v| PriceBand::new(v, v)),
        };
        Ok(band)
    }

    pub fn date<'de, D>(deserializer: D) -> Result<Option<DateValue>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let date = match value {
            Value::String(s) if !s.trim().is_empty() => Some(DateValue::Text(s)),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
                .map(DateValue::Timestamp),
            _ => None,
        };
        Ok(date)
    }
}
