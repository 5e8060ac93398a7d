mod cli;
mod commands;
mod infra;

use textlens::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
