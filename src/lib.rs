//! # Session-backed login on `tower-sessions`
//!
//! A small web application showing server-side session management with
//! [`tower-sessions`](https://crates.io/crates/tower-sessions) and Axum.
//!
//! The browser only ever holds a signed, opaque session id. Everything else,
//! here just the logged-in `username`, lives in a server-side session record
//! kept by one of two interchangeable stores:
//!
//! - [`MemoryStore`]: volatile, in-process; sessions vanish on restart.
//! - [`FileStore`]: one MessagePack file per session in a directory on disk.
//!
//! ## Routes
//!
//! | Method | Path      | Behaviour                                               |
//! |--------|-----------|---------------------------------------------------------|
//! | GET    | `/`       | Shows who is logged in, with a login or logout link     |
//! | GET    | `/login`  | Login form, or a notice if already logged in            |
//! | POST   | `/login`  | Stores `username` in the session and redirects to `/`   |
//! | GET    | `/logout` | Destroys the session and redirects to `/`               |
//!
//! ## Quick Start
//!
//! ```no_run
//! use tower_sessions_login_demo::{router, Config, FileStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//!
//! let store = FileStore::new(&config.session_dir);
//! store.init().await?;
//!
//! let app = router(store, &config)?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Session Policy
//!
//! Sessions expire after a rolling window of inactivity (24 hours unless
//! `SESSION_TTL_SECS` says otherwise). The file backend also runs a reaper
//! that sweeps expired files every `SESSION_CLEANUP_INTERVAL_SECS`.

pub mod app;
pub mod config;
pub mod error;
mod file_store;
pub mod handlers;
mod store;

pub use app::{build_store, router, serve, spawn_reaper};
pub use config::{Config, StoreKind};
pub use error::{AppError, ConfigError, Error};

/// The file-backed session store.
///
/// See [`FileStore`] documentation for the on-disk layout.
pub use file_store::FileStore;

/// Type-erased store used when the backend is picked at runtime.
pub use store::DynStore;

/// The volatile in-memory store, re-exported from `tower-sessions`.
pub use tower_sessions::MemoryStore;

/// Session type for manipulating the current session
///
/// Re-exported from `tower-sessions` for convenience.
pub use tower_sessions::Session;

/// Trait for implementing session storage backends
///
/// Implemented by [`FileStore`] and [`DynStore`].
pub use tower_sessions::SessionStore;

/// Trait for sweeping expired sessions
///
/// Implemented by [`FileStore`].
pub use tower_sessions::ExpiredDeletion;
