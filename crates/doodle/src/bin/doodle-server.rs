//! Binary entry point: installs a tracing subscriber, loads config, and
//! runs the server until the process is killed.

use doodle::{Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config();

    let server = Server::bind(config).await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await?;

    Ok(())
}

/// Starts from [`Config::default`] and overlays a handful of env vars, so
/// a deployment can tweak the bind address and dictionary path without a
/// config file. Anything more elaborate belongs in a config file loaded
/// by the caller, not in this binary.
fn load_config() -> Config {
    let mut config = Config::default();

    if let Ok(addr) = std::env::var("DOODLE_BIND_ADDRESS") {
        config.bind_address = addr;
    }
    if let Ok(path) = std::env::var("DOODLE_PHRASE_DICTIONARIES_PATH") {
        config.phrase_dictionaries_path = path.into();
    }

    config
}
