//! Router assembly and server startup.

use std::{net::SocketAddr, time::Duration};

use axum::{routing::get, Router};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_sessions::{
    cookie::Key, Expiry, ExpiredDeletion, MemoryStore, SessionManagerLayer, SessionStore,
};

use crate::{
    config::{Config, StoreKind, MIN_SECRET_LEN},
    error::{ConfigError, Error},
    file_store::FileStore,
    handlers,
    store::DynStore,
};

/// Builds the application router on top of `store`.
///
/// Cookies are signed with a key taken from `config.secret` and sessions
/// expire after `config.session_ttl` of inactivity.
pub fn router<S>(store: S, config: &Config) -> Result<Router, ConfigError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.secret.as_bytes()).map_err(|_| ConfigError::SecretTooShort {
        len: config.secret.len(),
        min: MIN_SECRET_LEN,
    })?;

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(config.secure_cookie)
        .with_expiry(Expiry::OnInactivity(config.session_ttl))
        .with_signed(key);

    Ok(Router::new()
        .route("/", get(handlers::home))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .layer(session_layer))
}

/// Builds the store `config` asks for.
///
/// The file backend gets its directory created and an expiry reaper running
/// in the background.
pub async fn build_store(config: &Config) -> Result<DynStore, Error> {
    match config.store {
        StoreKind::Memory => Ok(DynStore::new(MemoryStore::default())),
        StoreKind::File => {
            let store = FileStore::new(&config.session_dir);
            store.init().await?;
            tracing::info!(dir = %store.dir().display(), "storing sessions on disk");
            spawn_reaper(store.clone(), config.cleanup_interval);
            Ok(DynStore::new(store))
        }
    }
}

/// Periodically deletes expired sessions from `store`.
///
/// `continuously_delete_expired` stops at its first failure; the failure is
/// logged and the sweep resumes one period later.
pub fn spawn_reaper<S>(store: S, period: Duration) -> JoinHandle<()>
where
    S: ExpiredDeletion + Clone,
{
    tokio::spawn(async move {
        loop {
            if let Err(e) = store.clone().continuously_delete_expired(period).await {
                tracing::warn!(error = %e, "failed to delete expired sessions");
                tokio::time::sleep(period).await;
            }
        }
    })
}

/// Runs the application until the listener fails.
pub async fn serve(config: Config) -> Result<(), Error> {
    let store = build_store(&config).await?;
    let app = router(store, &config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = ?config.store, "Application started, listening...");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::OffsetDateTime;
    use tower_sessions::session::{Id, Record};

    use super::*;

    #[tokio::test]
    async fn reaper_sweeps_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.init().await.unwrap();

        let expired = Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() - time::Duration::minutes(1),
        };
        store.save(&expired).await.unwrap();
        let file = dir.path().join(format!("{}.session", expired.id));
        assert!(file.exists());

        let reaper = spawn_reaper(store, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;
        reaper.abort();

        assert!(!file.exists());
    }
}
