mod cli;
mod infra;
mod routes;
mod server;
mod terminal;

use carecheck::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
