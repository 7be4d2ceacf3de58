use dotenvy::dotenv;
use jm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};

#[tokio::main]
async fn main() -> Result<(), jm_api::error::ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    jm_api::run().await
}
