//! Runs the conformance server on `0.0.0.0:$PORT` (8000 by default).

use charset_testserver::{conformance_routes, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let router = conformance_routes(&config);

    HttpServer::new(config, router).start().await?;

    Ok(())
}
