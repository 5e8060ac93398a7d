use crate::infra::{parse_mode, parse_scheme, read_input, SystemClipboard};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use textlens::analysis::{
    AnalysisMode, GradeBand, HttpAnalysisGateway, RequestOrchestrator, ScoreInterpreter,
};
use textlens::config::{AppConfig, EndpointScheme};
use textlens::error::AppError;
use textlens::export::{
    Clipboard, DocumentExporter, ExportError, PagedTextLayout, PdfLayout, PDF_LINES_PER_PAGE,
    PDF_LINE_WIDTH, TEXT_LINES_PER_PAGE, TEXT_LINE_WIDTH,
};
use textlens::report::compose;
use textlens::telemetry;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Analysis mode: readability, tone or plagiarism (defaults to the first enabled mode)
    #[arg(long, value_parser = parse_mode)]
    pub(crate) mode: Option<AnalysisMode>,
    /// Text to analyze; read from --file or stdin when omitted
    #[arg(long, conflicts_with = "file")]
    pub(crate) text: Option<String>,
    /// File containing the text to analyze
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// Override the configured analysis service base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
    /// Override the configured endpoint scheme (per_mode or unified)
    #[arg(long, value_parser = parse_scheme)]
    pub(crate) endpoint_scheme: Option<EndpointScheme>,
    /// Print the result and composed report as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Copy the text report to the system clipboard
    #[arg(long)]
    pub(crate) copy: bool,
    /// Write a paginated document report (defaults to AI_Report.pdf or AI_Report.txt)
    #[arg(long, value_name = "PATH")]
    pub(crate) export: Option<Option<PathBuf>>,
    /// Document format used by --export
    #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
    pub(crate) format: ExportFormat,
    /// Column width of the exported document
    #[arg(long)]
    pub(crate) page_width: Option<usize>,
    /// Body lines per exported page
    #[arg(long)]
    pub(crate) page_lines: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Pdf,
    Text,
}

impl ExportFormat {
    fn exporter(
        self,
        page_width: Option<usize>,
        page_lines: Option<usize>,
        generated_at: DateTime<Utc>,
    ) -> Result<Box<dyn DocumentExporter>, ExportError> {
        Ok(match self {
            Self::Pdf => Box::new(
                PdfLayout::new(
                    page_width.unwrap_or(PDF_LINE_WIDTH),
                    page_lines.unwrap_or(PDF_LINES_PER_PAGE),
                )?
                .with_timestamp(generated_at),
            ),
            Self::Text => Box::new(
                PagedTextLayout::new(
                    page_width.unwrap_or(TEXT_LINE_WIDTH),
                    page_lines.unwrap_or(TEXT_LINES_PER_PAGE),
                )?
                .with_timestamp(generated_at),
            ),
        })
    }
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Reading-ease score reported by the analysis service
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) ease: f64,
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        mode,
        text,
        file,
        backend_url,
        endpoint_scheme,
        json,
        copy,
        export,
        format,
        page_width,
        page_lines,
    } = args;

    let mut config = AppConfig::load()?;
    config.override_with(backend_url, endpoint_scheme)?;

    telemetry::init(&config.telemetry)?;

    let export = match export {
        Some(path) => {
            let exporter = format.exporter(page_width, page_lines, Utc::now())?;
            let path = path.unwrap_or_else(|| PathBuf::from(exporter.default_file_name()));
            Some((exporter, path))
        }
        None => None,
    };
    let text = read_input(text, file)?;

    let gateway = HttpAnalysisGateway::new(
        config.backend.base_url.clone(),
        config.analysis.endpoints.clone(),
        config.backend.timeout,
    )?;
    let mut orchestrator = RequestOrchestrator::new(Arc::new(gateway), &config.analysis);
    if let Some(mode) = mode {
        orchestrator.select_mode(mode)?;
    }

    info!(
        environment = ?config.environment,
        base_url = %config.backend.base_url,
        mode = %orchestrator.mode(),
        "submitting text for analysis"
    );
    let result = orchestrator.analyze(&text).await?;
    let report = compose(result);

    if json {
        let payload = json!({ "result": result, "report": &report });
        let rendered = serde_json::to_string_pretty(&payload).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        println!("{}", report.text);
    }

    if copy {
        if SystemClipboard.write_text(&report.text) {
            eprintln!("Report copied to clipboard");
        } else {
            eprintln!("Could not copy the report to the clipboard");
        }
    }

    if let Some((exporter, path)) = export {
        exporter.write_file(&report.title, &report.document, &path)?;
        eprintln!("Report exported to {}", path.display());
    }

    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) {
    let interpretation = ScoreInterpreter::classify(Some(args.ease));
    println!("Grade band: {}", interpretation.level.label());
    if interpretation.level != GradeBand::Indeterminate {
        println!("Reading ease: {:.2}", args.ease);
    }
    println!("{}", interpretation.message);
}

pub(crate) fn run_modes() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gateway = HttpAnalysisGateway::new(
        config.backend.base_url.clone(),
        config.analysis.endpoints.clone(),
        config.backend.timeout,
    )?;

    println!("Analysis service: {}", config.backend.base_url);
    for mode in &config.analysis.modes {
        println!("- {}: {}", mode.label(), gateway.endpoint_url(*mode));
    }
    Ok(())
}
