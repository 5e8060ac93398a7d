mod content;
mod render;
pub mod views;

pub use content::{ReportBlock, ReportContent, ReportField, NOT_AVAILABLE};
pub use render::compose;
pub use views::{ComposedReport, Section, REPORT_TITLE};
