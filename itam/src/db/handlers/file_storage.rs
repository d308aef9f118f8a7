use crate::db::{
    errors::{DbError, Result},
    models::file_storage::StoredFile,
};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Readable handle on a stored file
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Trait for package file storage backends. Files are addressed by a plain file name.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store file content under `name`, replacing any previous file with that name
    async fn store(&self, name: &str, content: &[u8]) -> Result<StoredFile>;

    /// Open a stored file for streaming, along with its size
    async fn open(&self, name: &str) -> Result<(FileReader, u64)>;

    /// Delete a file, returning whether it existed
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Check if a file exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// All stored files, sorted by name
    async fn list(&self) -> Result<Vec<StoredFile>>;
}

/// Subdirectory of the storage directory where uploads are written before being moved into place.
pub const STAGING_DIR: &str = ".incoming";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Whether `name` is a single path segment that cannot escape the storage directory.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name == STAGING_DIR || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Local filesystem storage backend - stores files flat in a single directory
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if !is_plain_file_name(name) {
            return Err(DbError::Other(anyhow::anyhow!("invalid file name {name:?}")));
        }
        Ok(self.base_path.join(name))
    }
}

async fn write_synced(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let mut file = fs::File::create(path).await.with_context(|| format!("create {}", path.display()))?;
    file.write_all(content).await.with_context(|| format!("write {}", path.display()))?;
    file.sync_all().await.with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, name: &str, content: &[u8]) -> Result<StoredFile> {
        let full_path = self.path_for(name)?;

        let staging = self.base_path.join(STAGING_DIR);
        fs::create_dir_all(&staging)
            .await
            .with_context(|| format!("create staging directory {}", staging.display()))?;

        // The previous file stays in place until the new content is fully on disk
        let partial = staging.join(format!("{name}.{}.{}", std::process::id(), STAGING_SEQ.fetch_add(1, Ordering::Relaxed)));
        if let Err(e) = write_synced(&partial, content).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&partial, &full_path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(anyhow::Error::from(e).context(format!("move upload into {}", full_path.display())).into());
        }

        Ok(StoredFile {
            name: name.to_string(),
            size: content.len() as u64,
        })
    }

    async fn open(&self, name: &str) -> Result<(FileReader, u64)> {
        if !is_plain_file_name(name) {
            return Err(DbError::NotFound);
        }
        let full_path = self.base_path.join(name);

        let file = match fs::File::open(&full_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(DbError::NotFound),
            Err(e) => return Err(anyhow::Error::from(e).context(format!("open {}", full_path.display())).into()),
        };
        let metadata = file
            .metadata()
            .await
            .with_context(|| format!("stat {}", full_path.display()))?;
        if !metadata.is_file() {
            return Err(DbError::NotFound);
        }

        Ok((Box::new(file), metadata.len()))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        if !is_plain_file_name(name) {
            return Ok(false);
        }
        let full_path = self.base_path.join(name);

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::Error::from(e).context(format!("remove {}", full_path.display())).into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        if !is_plain_file_name(name) {
            return Ok(false);
        }
        let full_path = self.base_path.join(name);
        let exists = fs::try_exists(&full_path)
            .await
            .with_context(|| format!("stat {}", full_path.display()))?;
        Ok(exists && full_path.is_file())
    }

    async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            // Nothing uploaded yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(anyhow::Error::from(e).context(format!("list {}", self.base_path.display())).into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.context("read upload directory entry")? {
            let metadata = entry.metadata().await.context("read file metadata")?;
            if !metadata.is_file() {
                continue;
            }
            // Names that are not valid UTF-8 cannot be addressed through the API
            if let Ok(name) = entry.file_name().into_string() {
                files.push(StoredFile {
                    name,
                    size: metadata.len(),
                });
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(files)
    }
}
