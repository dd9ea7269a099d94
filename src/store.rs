//! Runtime selection of the session backend.

use std::sync::Arc;

use async_trait::async_trait;
use tower_sessions::{session::Id, session::Record, session_store, SessionStore};

/// A cloneable handle to any [`SessionStore`].
///
/// [`SessionManagerLayer`](tower_sessions::SessionManagerLayer) is generic
/// over a concrete store type, while the backend here is chosen from
/// configuration at startup. `DynStore` gives the layer one concrete type and
/// forwards every call to the boxed store.
#[derive(Debug, Clone)]
pub struct DynStore(Arc<dyn SessionStore>);

impl DynStore {
    pub fn new(store: impl SessionStore) -> Self {
        Self(Arc::new(store))
    }
}

#[async_trait]
impl SessionStore for DynStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.0.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.0.save(record).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        self.0.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.0.delete(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::{Duration, OffsetDateTime};
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn forwards_to_inner_store() {
        let inner = MemoryStore::default();
        let store = DynStore::new(inner.clone());
        let mut record = Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + Duration::hours(1),
        };

        store.create(&mut record).await.unwrap();
        assert!(inner.load(&record.id).await.unwrap().is_some());

        store.delete(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(inner.load(&record.id).await.unwrap().is_none());
    }
}
