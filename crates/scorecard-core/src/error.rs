use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorecardError {
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
