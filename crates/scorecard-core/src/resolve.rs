//! Lookup of typed blocks in an [`AnalyzeResponse`] by discriminator tag.
//!
//! The first block carrying the requested tag wins; later duplicates are
//! ignored. A missing block is `None`, never an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{AnalyzeResponse, Block, FinancialQualityBlock, TermsAndFinancialsBlock, VerdictBlock};
use crate::ScorecardError;

/// The `component` tags this crate knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    TermsAndFinancials,
    FinancialQuality,
    Verdict,
}

impl BlockKind {
    pub const ALL: [BlockKind; 3] = [
        BlockKind::TermsAndFinancials,
        BlockKind::FinancialQuality,
        BlockKind::Verdict,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::TermsAndFinancials => "terms_and_financials",
            BlockKind::FinancialQuality => "financial_quality",
            BlockKind::Verdict => "verdict",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for BlockKind {
    type Err = ScorecardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|k| k.tag() == s)
            .ok_or_else(|| ScorecardError::UnknownComponent(s.to_string()))
    }
}

impl Block {
    /// `None` for blocks with a tag this build does not recognise.
    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Block::TermsAndFinancials(_) => Some(BlockKind::TermsAndFinancials),
            Block::FinancialQuality(_) => Some(BlockKind::FinancialQuality),
            Block::Verdict(_) => Some(BlockKind::Verdict),
            Block::Unknown => None,
        }
    }
}

/// First block in `response` whose tag is `kind`.
pub fn resolve(response: &AnalyzeResponse, kind: BlockKind) -> Option<&Block> {
    response.components.iter().find(|b| b.kind() == Some(kind))
}

pub fn terms_and_financials(response: &AnalyzeResponse) -> Option<&TermsAndFinancialsBlock> {
    match resolve(response, BlockKind::TermsAndFinancials)? {
        Block::TermsAndFinancials(block) => Some(block),
        _ => None,
    }
}

pub fn financial_quality(response: &AnalyzeResponse) -> Option<&FinancialQualityBlock> {
    match resolve(response, BlockKind::FinancialQuality)? {
        Block::FinancialQuality(block) => Some(block),
        _ => None,
    }
}

pub fn verdict(response: &AnalyzeResponse) -> Option<&VerdictBlock> {
    match resolve(response, BlockKind::Verdict)? {
        Block::Verdict(block) => Some(block),
        _ => None,
    }
}
