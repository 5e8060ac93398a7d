use std::io::Read;
use std::path::PathBuf;
use textlens::analysis::AnalysisMode;
use textlens::config::EndpointScheme;
use textlens::export::Clipboard;
use tracing::warn;

pub(crate) fn parse_mode(raw: &str) -> Result<AnalysisMode, String> {
    raw.parse::<AnalysisMode>().map_err(|err| err.to_string())
}

pub(crate) fn parse_scheme(raw: &str) -> Result<EndpointScheme, String> {
    EndpointScheme::parse(raw).map_err(|_| format!("expected 'per_mode' or 'unified', got '{raw}'"))
}

/// Text comes from `--text`, then `--file`, then stdin.
pub(crate) fn read_input(text: Option<String>, file: Option<PathBuf>) -> std::io::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path);
    }

    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// System clipboard backed by `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> bool {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "clipboard write failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_modes_and_schemes() {
        assert_eq!(parse_mode("plagiarism"), Ok(AnalysisMode::Plagiarism));
        assert!(parse_mode("grammar").is_err());
        assert_eq!(parse_scheme("unified"), Ok(EndpointScheme::Unified));
        assert!(parse_scheme("sharded").is_err());
    }

    #[test]
    fn inline_text_wins_over_file() {
        let text = read_input(Some("inline".to_string()), Some(PathBuf::from("missing.txt")))
            .expect("inline text is used");
        assert_eq!(text, "inline");
    }

    #[test]
    fn reads_text_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "From a file.").expect("write temp file");
        let text = read_input(None, Some(file.path().to_path_buf())).expect("file read");
        assert_eq!(text, "From a file.");
    }
}
