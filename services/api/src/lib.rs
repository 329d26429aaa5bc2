mod batch;
mod cli;
mod infra;
mod routes;
mod server;

use audience_gate::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
