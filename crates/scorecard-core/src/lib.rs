pub mod error;
pub mod format;
pub mod resolve;
pub mod series;
pub mod types;

pub use error::*;
pub use resolve::*;
pub use types::*;
