use crate::commands::{run_analyze, run_classify, run_modes, AnalyzeArgs, ClassifyArgs};
use clap::{Parser, Subcommand};
use textlens::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "textlens",
    about = "Analyze text readability, tone and originality with a remote analysis service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit text for analysis and print the composed report
    Analyze(AnalyzeArgs),
    /// Map a reading-ease score onto its grade band without contacting the service
    Classify(ClassifyArgs),
    /// List the enabled analysis modes and the endpoint each one targets
    Modes,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => run_analyze(args).await,
        Command::Classify(args) => {
            run_classify(args);
            Ok(())
        }
        Command::Modes => run_modes(),
    }
}
