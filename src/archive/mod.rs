pub mod lister;
pub mod zip;

pub use lister::Lister;
pub use zip::{ZipCursor, ZipExtractor};

use std::path::Path;

use crate::s3::{ObjectBody, ObjectStore, StoreError};

/// An archive found in the source bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveObject {
    pub bucket: String,
    pub key: String,
}

impl ArchiveObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        ArchiveObject {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Folder the archive sits in, including the trailing `/`
    pub fn source_prefix(&self) -> &str {
        source_prefix(&self.key)
    }

    /// Archive file name without its folder
    pub fn file_name(&self) -> &str {
        base_name(&self.key)
    }

    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Open the archive body for a single sequential read
    pub async fn open(&self, store: &dyn ObjectStore) -> Result<ObjectBody, StoreError> {
        store.get_object(&self.bucket, &self.key).await
    }
}

/// Case-sensitive suffix match
pub fn is_archive_key(key: &str, suffix: &str) -> bool {
    key.ends_with(suffix)
}

/// Portion of a key up to and including its last `/`; empty at bucket root
pub fn source_prefix(key: &str) -> &str {
    match key.rfind('/') {
        Some(pos) => &key[..=pos],
        None => "",
    }
}

/// Portion of a key after its last `/`
pub fn base_name(key: &str) -> &str {
    match key.rfind('/') {
        Some(pos) => &key[pos + 1..],
        None => key,
    }
}

/// Destination key for an extracted file.
///
/// Only the file's own name is kept, so `x/y/report.csv` extracted from
/// `folderA/subB/data.zip` lands at `folderA/subB/report.csv`.
pub fn destination_key(prefix: &str, extracted: &Path) -> Option<String> {
    let name = extracted.file_name()?;
    Some(format!("{prefix}{}", name.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_prefix_and_base_name() {
        assert_eq!(source_prefix("folderA/subB/data.zip"), "folderA/subB/");
        assert_eq!(base_name("folderA/subB/data.zip"), "data.zip");
        assert_eq!(source_prefix("data.zip"), "");
        assert_eq!(base_name("data.zip"), "data.zip");
        assert_eq!(source_prefix("dir/"), "dir/");
        assert_eq!(base_name("dir/"), "");
    }

    #[test]
    fn test_is_archive_key_is_case_sensitive() {
        assert!(is_archive_key("in/a.zip", ".zip"));
        assert!(!is_archive_key("in/a.ZIP", ".zip"));
        assert!(!is_archive_key("in/a.zip.txt", ".zip"));
        assert!(!is_archive_key("in/notes.txt", ".zip"));
    }

    #[test]
    fn test_destination_key_flattens_nested_paths() {
        let archive = ArchiveObject::new("bucket", "folderA/subB/data.zip");
        let staged = Path::new("/tmp/s3unzip-1/x/y/report.csv");
        assert_eq!(
            destination_key(archive.source_prefix(), staged).as_deref(),
            Some("folderA/subB/report.csv")
        );
        assert_eq!(
            destination_key("", Path::new("/tmp/stage/a.txt")).as_deref(),
            Some("a.txt")
        );
    }

    #[test]
    fn test_archive_object_uri() {
        let archive = ArchiveObject::new("bucket", "in/a.zip");
        assert_eq!(archive.uri(), "s3://bucket/in/a.zip");
        assert_eq!(archive.file_name(), "a.zip");
    }
}
