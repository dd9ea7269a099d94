//! File-backed variant.
//!
//! Sessions are written to `SESSION_DIR` (default `./sessions`) and survive
//! restarts. Run with:
//!
//! ```bash
//! cargo run --bin file-store
//! ```
//!
//! Log in, restart the server, and the home page still knows who you are.

use tower_sessions_login_demo::{serve, Config};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    tracing::info!("Starting FileStore demo...");

    let config = Config::from_env()?.with_file_store();
    serve(config).await?;

    Ok(())
}
