/// A file held in package storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    /// Size in bytes
    pub size: u64,
}
