use anyhow::Context;
use log::info;
use warp::Filter;

use underwriting_server::config::ServerConfig;
use underwriting_server::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let addr = config.socket_addr();

    let api = routes::routes().with(routes::cors());
    info!("Starting underwriting API on {}", addr);

    warp::serve(api).run(addr).await;
    Ok(())
}
