//! Capability seams for the document-export and clipboard collaborators, plus
//! the paginated plain-text and PDF layouts used by the command line.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fmt::Debug;
use std::path::Path;
use tracing::debug;

use crate::report::Section;

/// File stem for exported reports; the extension comes from the exporter.
pub const DEFAULT_EXPORT_STEM: &str = "AI_Report";

pub const TEXT_LINE_WIDTH: usize = 80;
pub const TEXT_LINES_PER_PAGE: usize = 54;
pub const PDF_LINE_WIDTH: usize = 90;
pub const PDF_LINES_PER_PAGE: usize = 45;

const PAGE_BREAK: char = '\u{0C}';

// A4 portrait, in millimetres.
const PDF_PAGE_WIDTH: f32 = 210.0;
const PDF_PAGE_HEIGHT: f32 = 297.0;
const PDF_MARGIN: f32 = 15.0;
const PDF_TOP: f32 = 20.0;
const PDF_LINE_HEIGHT: f32 = 5.5;
const PDF_TITLE_SIZE: f32 = 14.0;
const PDF_BODY_SIZE: f32 = 10.0;
const PDF_LAYER: &str = "Report";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid page layout: {0}")]
    Layout(String),
    #[error("unable to render document: {0}")]
    Render(String),
    #[error("unable to write exported document: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns titled sections into a downloadable document.
pub trait DocumentExporter: Debug {
    fn export(&self, title: &str, sections: &[Section]) -> Result<Vec<u8>, ExportError>;
    fn file_extension(&self) -> &'static str;

    fn default_file_name(&self) -> String {
        format!("{DEFAULT_EXPORT_STEM}.{}", self.file_extension())
    }

    /// Render and write the document to `path`, replacing any existing file.
    fn write_file(
        &self,
        title: &str,
        sections: &[Section],
        path: &Path,
    ) -> Result<(), ExportError> {
        let bytes = self.export(title, sections)?;
        std::fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "report exported");
        Ok(())
    }
}

/// Places report text where the user can paste it. Returns whether the write
/// succeeded; failures are reported as a notice and never abort a report.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<String>,
}

/// Lays sections out top to bottom, wrapping long lines and splitting the
/// result into fixed-height pages with a numbered footer.
#[derive(Debug, Clone)]
pub struct PagedTextLayout {
    width: usize,
    lines_per_page: usize,
    generated_at: Option<DateTime<Utc>>,
}

impl Default for PagedTextLayout {
    fn default() -> Self {
        Self {
            width: TEXT_LINE_WIDTH,
            lines_per_page: TEXT_LINES_PER_PAGE,
            generated_at: None,
        }
    }
}

impl PagedTextLayout {
    /// `lines_per_page` counts body lines; the footer is added on top.
    pub fn new(width: usize, lines_per_page: usize) -> Result<Self, ExportError> {
        if width < 20 {
            return Err(ExportError::Layout(format!(
                "page width must be at least 20 columns, got {width}"
            )));
        }
        if lines_per_page < 4 {
            return Err(ExportError::Layout(format!(
                "pages must hold at least 4 lines, got {lines_per_page}"
            )));
        }
        Ok(Self {
            width,
            lines_per_page,
            generated_at: None,
        })
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn paginate(&self, title: &str, sections: &[Section]) -> Vec<Page> {
        let mut body = self.wrap(title);
        for section in sections {
            body.push(String::new());
            body.extend(self.wrap(&section.title));
            for line in &section.lines {
                body.extend(self.wrap(line));
            }
        }

        let chunks: Vec<&[String]> = body.chunks(self.lines_per_page).collect();
        let total = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let number = index + 1;
                let mut lines = chunk.to_vec();
                lines.push(String::new());
                lines.push(self.footer(number, total));
                Page { number, lines }
            })
            .collect()
    }

    fn wrap(&self, line: &str) -> Vec<String> {
        if line.is_empty() {
            return vec![String::new()];
        }
        textwrap::wrap(line, self.width)
            .into_iter()
            .map(|part| part.into_owned())
            .collect()
    }

    fn footer(&self, number: usize, total: usize) -> String {
        match self.generated_at {
            Some(stamp) => format!(
                "Page {number} of {total} | Generated {}",
                stamp.format("%Y-%m-%d %H:%M UTC")
            ),
            None => format!("Page {number} of {total}"),
        }
    }
}

impl DocumentExporter for PagedTextLayout {
    fn export(&self, title: &str, sections: &[Section]) -> Result<Vec<u8>, ExportError> {
        let pages: Vec<String> = self
            .paginate(title, sections)
            .into_iter()
            .map(|page| page.lines.join("\n"))
            .collect();

        let mut rendered = pages.join(&format!("\n{PAGE_BREAK}"));
        rendered.push('\n');
        Ok(rendered.into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

/// A4 PDF rendering of the same pages the text layout produces, set in the
/// built-in Helvetica face so no font files are needed.
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pages: PagedTextLayout,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            pages: PagedTextLayout {
                width: PDF_LINE_WIDTH,
                lines_per_page: PDF_LINES_PER_PAGE,
                generated_at: None,
            },
        }
    }
}

impl PdfLayout {
    pub fn new(width: usize, lines_per_page: usize) -> Result<Self, ExportError> {
        let pages = PagedTextLayout::new(width, lines_per_page)?;
        let printable = (PDF_PAGE_HEIGHT - PDF_TOP - PDF_MARGIN) / PDF_LINE_HEIGHT;
        // body lines plus the blank line and footer must fit inside the margins
        if (lines_per_page + 2) as f32 > printable {
            return Err(ExportError::Layout(format!(
                "an A4 page holds at most {} lines, got {lines_per_page}",
                printable as usize - 2
            )));
        }
        Ok(Self { pages })
    }

    pub fn with_timestamp(self, generated_at: DateTime<Utc>) -> Self {
        Self {
            pages: self.pages.with_timestamp(generated_at),
        }
    }

    pub fn paginate(&self, title: &str, sections: &[Section]) -> Vec<Page> {
        self.pages.paginate(title, sections)
    }
}

impl DocumentExporter for PdfLayout {
    fn export(&self, title: &str, sections: &[Section]) -> Result<Vec<u8>, ExportError> {
        let pages = self.paginate(title, sections);
        let (document, first_page, first_layer) = PdfDocument::new(
            title,
            Mm(PDF_PAGE_WIDTH),
            Mm(PDF_PAGE_HEIGHT),
            PDF_LAYER,
        );
        let font = document
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ExportError::Render(err.to_string()))?;
        let bold = document
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| ExportError::Render(err.to_string()))?;

        for (index, page) in pages.iter().enumerate() {
            let (page_index, layer_index) = if index == 0 {
                (first_page, first_layer)
            } else {
                document.add_page(Mm(PDF_PAGE_WIDTH), Mm(PDF_PAGE_HEIGHT), PDF_LAYER)
            };
            let layer = document.get_page(page_index).get_layer(layer_index);

            let mut y = PDF_PAGE_HEIGHT - PDF_TOP;
            for (line_number, line) in page.lines.iter().enumerate() {
                if !line.is_empty() {
                    let (size, face) = if index == 0 && line_number == 0 {
                        (PDF_TITLE_SIZE, &bold)
                    } else {
                        (PDF_BODY_SIZE, &font)
                    };
                    layer.use_text(line.as_str(), size, Mm(PDF_MARGIN), Mm(y), face);
                }
                y -= PDF_LINE_HEIGHT;
            }
        }

        document
            .save_to_bytes()
            .map_err(|err| ExportError::Render(err.to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sections(count: usize) -> Vec<Section> {
        vec![Section {
            title: "Raw Metrics".to_string(),
            lines: (0..count).map(|index| format!("metric {index}: 1.00")).collect(),
        }]
    }

    #[test]
    fn rejects_degenerate_layouts() {
        assert!(matches!(
            PagedTextLayout::new(10, 40),
            Err(ExportError::Layout(_))
        ));
        assert!(matches!(
            PagedTextLayout::new(80, 2),
            Err(ExportError::Layout(_))
        ));
    }

    #[test]
    fn short_reports_fit_on_one_page() {
        let layout = PagedTextLayout::default();
        let pages = layout.paginate("Report", &sections(3));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.first().map(String::as_str), Some("Report"));
        assert_eq!(
            pages[0].lines.last().map(String::as_str),
            Some("Page 1 of 1")
        );
    }

    #[test]
    fn long_reports_split_across_numbered_pages() {
        let layout = PagedTextLayout::new(40, 10).expect("valid layout");
        // title + blank + heading + 25 lines = 28 body lines
        let pages = layout.paginate("Report", &sections(25));
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].number, 3);
        assert_eq!(
            pages[1].lines.last().map(String::as_str),
            Some("Page 2 of 3")
        );
        assert_eq!(pages[2].lines.len(), 8 + 2);
    }

    #[test]
    fn long_lines_are_wrapped_to_width() {
        let layout = PagedTextLayout::new(20, 40).expect("valid layout");
        let long = Section {
            title: "Insight".to_string(),
            lines: vec!["Suggestion: use shorter sentences and plainer words".to_string()],
        };
        let pages = layout.paginate("Report", &[long]);
        let body = &pages[0].lines;
        assert!(body.iter().all(|line| line.chars().count() <= 20), "{body:?}");
        assert!(body.iter().any(|line| line.contains("plainer words")));
    }

    #[test]
    fn export_separates_pages_and_stamps_footer() {
        let stamp = Utc
            .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp");
        let layout = PagedTextLayout::new(40, 10)
            .expect("valid layout")
            .with_timestamp(stamp);

        let bytes = layout
            .export("Report", &sections(12))
            .expect("export succeeds");
        let text = String::from_utf8(bytes).expect("utf-8 output");
        assert_eq!(text.matches(PAGE_BREAK).count(), 1);
        assert!(text.contains("Page 2 of 2 | Generated 2025-03-14 09:30 UTC"));
        assert_eq!(layout.file_extension(), "txt");
        assert_eq!(layout.default_file_name(), "AI_Report.txt");
    }

    #[test]
    fn pdf_export_produces_a_pdf_document() {
        let layout = PdfLayout::default();
        assert_eq!(layout.file_extension(), "pdf");
        assert_eq!(layout.default_file_name(), "AI_Report.pdf");

        let bytes = layout
            .export("AI Readability, Tone & Plagiarism Report", &sections(5))
            .expect("pdf renders");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.windows(5).any(|window| window == b"%%EOF"));
    }

    #[test]
    fn pdf_pages_follow_the_text_pagination() {
        let layout = PdfLayout::new(60, 10).expect("valid layout");
        let pages = layout.paginate("Report", &sections(25));
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages[2].lines.last().map(String::as_str),
            Some("Page 3 of 3")
        );
        assert!(layout.export("Report", &sections(25)).is_ok());
    }

    #[test]
    fn pdf_rejects_pages_taller_than_a4() {
        assert!(matches!(
            PdfLayout::new(90, 200),
            Err(ExportError::Layout(_))
        ));
        assert!(PdfLayout::new(PDF_LINE_WIDTH, PDF_LINES_PER_PAGE).is_ok());
    }

    #[test]
    fn write_file_reports_io_failures() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = PagedTextLayout::default();

        let path = dir.path().join(layout.default_file_name());
        layout
            .write_file("Report", &sections(2), &path)
            .expect("export written");
        let written = std::fs::read_to_string(&path).expect("export readable");
        assert!(written.starts_with("Report\n"));

        let missing = dir.path().join("absent").join("AI_Report.txt");
        assert!(matches!(
            layout.write_file("Report", &sections(2), &missing),
            Err(ExportError::Io(_))
        ));
    }
}
