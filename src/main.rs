use dotenv::dotenv;
use settlerbot::infra::{ServerConfig, init_logging};
use settlerbot::planners::rl::RLExecutor;
use settlerbot::server::Server;
use settlerbot::InferenceBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = ServerConfig::from_env();
    config.log();

    let device = Default::default();
    let executor = RLExecutor::<InferenceBackend>::load(config.inference.clone(), device);

    Server::run(config, executor).await?;
    Ok(())
}
