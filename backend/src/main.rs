//! Service entry point: tracing bootstrap, database connection, HTTP server.

mod server;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::web;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{MongoConfig, MongoUserStore};
use server::ServerConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE: &str = "devnet";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned())
        .parse()
        .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?;

    let mut config = ServerConfig::new(bind_addr);
    if let Ok(uri) = env::var("MONGODB_URI") {
        let mongo = MongoConfig {
            uri,
            database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| DEFAULT_DATABASE.to_owned()),
        };
        match MongoUserStore::connect(&mongo).await {
            Ok(store) => {
                // Keep serving even when the first round trip fails; requests
                // surface store faults as errors until the database is back.
                match store.ensure_indexes().await {
                    Ok(()) => info!(database = %mongo.database, "database connected"),
                    Err(err) => error!(error = %err, "error connecting to database"),
                }
                config = config.with_user_store(Arc::new(store));
            }
            Err(err) => error!(error = %err, "error connecting to database"),
        }
    } else {
        warn!("MONGODB_URI not set; using the in-memory store");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = server::create_server(health_state, config)?;
    info!(%bind_addr, "server running");
    server.await
}
