pub mod chart;
pub mod html;
pub mod page;
pub mod sections;

pub use page::{render_page, PageContext, UploadForm};
pub use sections::*;
