//! Example: Standalone Query Responder
//!
//! Serves GameSpy 4 queries for a fake server until CTRL+C. Configure with
//! `GS4_QUERY_ADDRESS`, `GS4_QUERY_MAX_DATAGRAM` and `GS4_QUERY_LOG_LEVEL`.
//!
//! Run with: `cargo run --example query_server`

use gs4_query::config::QueryConfig;
use gs4_query::utils::logging::init_logging;
use gs4_query::{QueryHandler, QueryListener, ServerInfo};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = QueryConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging)?;

    let mut info = ServerInfo::new();
    info.insert("hostname".into(), "A Rust Server".into());
    info.insert("gametype".into(), "SMP".into());
    info.insert("game_id".into(), "MINECRAFTPE".into());
    info.insert("version".into(), "1.21.0".into());
    info.insert("plugins".into(), String::new());
    info.insert("map".into(), "world".into());
    info.insert("numplayers".into(), "2".into());
    info.insert("maxplayers".into(), "20".into());
    info.insert("hostport".into(), "19132".into());
    info.insert("hostip".into(), "0.0.0.0".into());

    let handler = Arc::new(QueryHandler::new(
        info,
        vec!["Steve".into(), "Alex".into()],
    )?);

    let listener = QueryListener::bind(&config.server, handler).await?;
    println!("Listening for queries on {}", listener.local_addr()?);
    listener.run().await?;
    Ok(())
}
