mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use ambulance_dispatch::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
