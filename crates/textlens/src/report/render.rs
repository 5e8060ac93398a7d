use super::content::{ReportContent, ReportField};
use super::views::{ComposedReport, Section, REPORT_TITLE};
use crate::analysis::AnalysisResult;

/// Render a completed analysis as clipboard text and document sections.
pub fn compose(result: &AnalysisResult) -> ComposedReport {
    let content = ReportContent::from_result(result);

    let document: Vec<Section> = content
        .blocks
        .iter()
        .map(|block| Section {
            title: block.heading.clone(),
            lines: block.fields.iter().map(ReportField::line).collect(),
        })
        .collect();

    ComposedReport {
        title: REPORT_TITLE.to_string(),
        text: render_text(REPORT_TITLE, &document),
        document,
    }
}

fn render_text(title: &str, sections: &[Section]) -> String {
    let mut lines = vec![title.to_string()];
    for section in sections {
        lines.push(String::new());
        lines.push(section.title.clone());
        lines.extend(section.lines.iter().cloned());
    }
    lines.join("\n")
}
