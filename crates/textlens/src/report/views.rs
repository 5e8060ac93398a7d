use serde::Serialize;

pub const REPORT_TITLE: &str = "AI Readability, Tone & Plagiarism Report";

/// Titled group of body lines handed to the document-export collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

/// Both renderings of one result. `text` goes to the clipboard, `document` to
/// the paginated exporter; they are built from the same content and list the
/// same fields in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedReport {
    pub title: String,
    pub text: String,
    pub document: Vec<Section>,
}
