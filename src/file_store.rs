use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt};
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};

/// Extension given to every session file.
const EXTENSION: &str = "session";

/// Extension of in-flight writes, renamed over the record once complete.
const TMP_EXTENSION: &str = "tmp";

/// Temporary files older than this were left behind by an interrupted write.
const STALE_TMP_AGE: Duration = Duration::from_secs(60);

/// Upper bound on fresh ids drawn when `create` hits an existing file.
const MAX_COLLISION_RETRIES: u32 = 32;

/// A file-backed session store for tower-sessions.
///
/// Every session lives in its own file, `<dir>/<id>.session`, holding the
/// MessagePack encoding of the whole [`Record`]. Session ids are base64url
/// strings, so they are always valid file names.
///
/// # Usage
///
/// ```no_run
/// use time::Duration;
/// use tower_sessions::{Expiry, SessionManagerLayer};
/// use tower_sessions_login_demo::FileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileStore::new("./sessions");
/// store.init().await?;
///
/// let session_layer = SessionManagerLayer::new(store)
///     .with_expiry(Expiry::OnInactivity(Duration::hours(24)));
/// # Ok(())
/// # }
/// ```
///
/// # Concurrency
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the record, so readers never see a half-written session. There is no
/// locking across overlapping requests for the same session: the last save
/// wins.
///
/// # Error Handling
///
/// - I/O errors → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Arc<PathBuf>,
}

impl FileStore {
    /// Creates a store rooted at `dir`. Nothing touches the disk until
    /// [`FileStore::init`] or the first session operation.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    /// Creates the session directory, including missing parents.
    pub async fn init(&self) -> session_store::Result<()> {
        fs::create_dir_all(self.dir.as_path()).await.map_err(backend)
    }

    /// The directory sessions are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &Id) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn write_record(&self, record: &Record) -> session_store::Result<()> {
        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        // Random suffix keeps concurrent writers of the same id apart.
        let tmp = self
            .dir
            .join(format!(".{}.{}.{TMP_EXTENSION}", record.id, Id::default()));
        if let Err(e) = write_atomic(&tmp, &self.path_for(&record.id), &data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(backend(e));
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    /// Reserves a file for a new session and writes the record into it.
    ///
    /// The file is opened with `create_new`, so an id that already exists on
    /// disk is never overwritten; a fresh id is drawn instead.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut attempts = 0;
        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path_for(&record.id))
                .await
            {
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempts += 1;
                    if attempts >= MAX_COLLISION_RETRIES {
                        return Err(session_store::Error::Backend(
                            "could not allocate a unique session id".to_string(),
                        ));
                    }
                    record.id = Id::default();
                }
                Err(e) => return Err(backend(e)),
            }
        }

        self.write_record(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.write_record(record).await
    }

    /// Loads a session, treating missing and expired files alike.
    ///
    /// An expired file is removed on the way out.
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let path = self.path_for(session_id);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(backend(e)),
        };

        let record: Record =
            rmp_serde::from_slice(&data).map_err(|e| session_store::Error::Decode(e.to_string()))?;

        if is_expired(&record, OffsetDateTime::now_utc()) {
            remove_if_present(&path).await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        remove_if_present(&self.path_for(session_id)).await
    }
}

#[async_trait]
impl ExpiredDeletion for FileStore {
    /// Removes every expired session file.
    ///
    /// Files that no longer decode as a session record are removed as well,
    /// since no request could ever load them again, and so are temporary
    /// files abandoned by a write that never reached its rename.
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut entries = match fs::read_dir(self.dir.as_path()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(backend(e)),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(backend)? {
            let path = entry.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(EXTENSION) => {}
                Some(TMP_EXTENSION) => {
                    if is_abandoned(&entry).await {
                        remove_if_present(&path).await?;
                        removed += 1;
                    }
                    continue;
                }
                _ => continue,
            }

            let data = match fs::read(&path).await {
                Ok(data) => data,
                // Deleted by a concurrent logout.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(backend(e)),
            };

            let stale = match rmp_serde::from_slice::<Record>(&data) {
                Ok(record) => is_expired(&record, now),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "dropping unreadable session file");
                    true
                }
            };

            if stale {
                remove_if_present(&path).await?;
                removed += 1;
            }
        }

        tracing::debug!(removed, dir = %self.dir.display(), "deleted expired sessions");
        Ok(())
    }
}

async fn write_atomic(tmp: &Path, dest: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, dest).await
}

/// A temporary file nobody has touched for [`STALE_TMP_AGE`].
async fn is_abandoned(entry: &fs::DirEntry) -> bool {
    let Ok(modified) = entry.metadata().await.and_then(|meta| meta.modified()) else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .is_ok_and(|age| age >= STALE_TMP_AGE)
}

fn is_expired(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date <= now
}

async fn remove_if_present(path: &Path) -> session_store::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(backend(e)),
    }
}

fn backend(e: std::io::Error) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}
