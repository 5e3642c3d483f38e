use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use andar_bahar::config::AppConfig;
use andar_bahar::server::run_server;
use andar_bahar::store::{
    BalanceLedger, InMemoryBalances, InMemorySessionStore, SessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let config = AppConfig::parse();
    init_tracing(config.log_json);

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let balances: Arc<dyn BalanceLedger> = Arc::new(InMemoryBalances::new());
    run_server(config.server_config(), store, balances).await
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}
