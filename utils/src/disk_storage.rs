//! Utilities for storing a struct in a JSON file on the disk.
//! The struct should implement Serialize and Deserialize from serde.

use std::{fmt::Debug, fs, io::Write, path::Path};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

pub trait DiskStorageInterface
where
    Self: Sized + Debug + Default + Serialize + DeserializeOwned,
{
    /// Load the content from the file if it exists otherwise return the default value
    fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| crate::Error::FileReadFailed(path.to_path_buf(), e))?;

        serde_json::from_str(&content)
            .map_err(|e| crate::Error::JsonParsingFailed(path.to_path_buf(), e))
    }

    /// Save content to the file, replacing what was there and creating
    /// directories as necessary. The content goes to a sibling temp file that
    /// is renamed over `path`, so a crash mid-write keeps the previous file.
    fn save(&self, path: &Path) -> crate::Result<()> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .map_err(|e| crate::Error::CreateDirAllFailed(parent.to_path_buf(), e))?;
                parent
            }
            None => Path::new("."),
        };

        let content = serde_json::to_string(self).map_err(crate::Error::JsonFormattingFailed)?;

        let write_failed = |e: std::io::Error| crate::Error::FileWriteFailed(path.to_path_buf(), e);
        let mut file = NamedTempFile::new_in(parent).map_err(write_failed)?;
        file.write_all(content.as_bytes()).map_err(write_failed)?;
        file.persist(path).map_err(|e| write_failed(e.error))?;

        Ok(())
    }
}
