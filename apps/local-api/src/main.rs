use anyhow::{bail, Result};
use http::Method;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use local_api::config::Config;
use local_api::repository::Repository;
use local_api::storage::DocumentStore;
use local_api::LocalApi;

const USAGE: &str = "usage: local-api <user | list | show <id> | create [name] | delete <id> | import <file> | repair | clear>";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "local-api v{} using data file {}",
        env!("CARGO_PKG_VERSION"),
        config.data_path.display()
    );

    let store = DocumentStore::at_path(&config.data_path);
    let api = LocalApi::new(Repository::new(store));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let response = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["user"] => api.dispatch(Method::GET, "/user/me", None).await?,
        ["list"] => api.dispatch(Method::GET, "/resume", None).await?,
        ["show", id] => {
            api.dispatch(Method::GET, &format!("/resume/{id}"), None)
                .await?
        }
        ["create"] => api.dispatch(Method::POST, "/resume", Some(json!({}))).await?,
        ["create", name] => {
            api.dispatch(Method::POST, "/resume", Some(json!({ "name": name })))
                .await?
        }
        ["delete", id] => {
            api.dispatch(Method::DELETE, &format!("/resume/{id}"), None)
                .await?
        }
        ["import", file] => {
            let raw = std::fs::read_to_string(file)?;
            let external: serde_json::Value = serde_json::from_str(&raw)?;
            api.dispatch(Method::POST, "/resume/import", Some(external))
                .await?
        }
        ["repair"] => {
            api.repository().store().repair()?;
            println!("repaired");
            return Ok(());
        }
        ["clear"] => {
            api.repository().clear_all_data()?;
            println!("cleared");
            return Ok(());
        }
        _ => bail!(USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&response.data)?);
    Ok(())
}
