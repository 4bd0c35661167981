use aws_sdk_dynamodb::Client;
use lambda_http::{service_fn, Request};
use session_replay::{
    config::Config,
    console,
    store::SessionStore,
    utils::{setup_sdk_config, setup_tracing},
};
use tracing::{info, instrument};

type E = Box<dyn std::error::Error + Sync + Send + 'static>;

#[instrument]
#[tokio::main]
async fn main() -> Result<(), E> {
    setup_tracing();

    let cfg = Config::from_env();
    let sdk_config = setup_sdk_config().await;
    let ddb = Client::new(&sdk_config);
    let store = SessionStore::new(&ddb, cfg.table_name.clone(), cfg.index_name.clone());

    lambda_http::run(service_fn(|event: Request| {
        console::handle(&cfg, &store, event)
    }))
    .await?;
    info!("execution started");

    Ok(())
}
