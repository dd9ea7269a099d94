//! In-memory variant.
//!
//! Sessions live in process memory and are lost on restart. Run with:
//!
//! ```bash
//! cargo run --bin memory-store
//! ```
//!
//! then open http://127.0.0.1:3000.

use tower_sessions_login_demo::{serve, Config};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = Config::from_env()?.with_memory_store();
    serve(config).await?;

    Ok(())
}
