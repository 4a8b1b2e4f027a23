use super::backend::StorageBackend;
use crate::error::{FermeError, Result};
use crate::model::TableSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Single JSON file holding every table, pretty-printed.
///
/// Each save rewrites the whole file in place. There is no temp file and no rename,
/// so a crash mid-write can leave a truncated file; the next load then falls back to
/// seed data. Two processes sharing one file overwrite each other's changes.
pub struct FsBackend {
    path: PathBuf,
}

impl FsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(FermeError::Io)?;
            }
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Option<TableSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(FermeError::Io)?;
        let tables: TableSet = serde_json::from_str(&content).map_err(FermeError::Serialization)?;
        Ok(Some(tables))
    }

    fn save(&self, tables: &TableSet) -> Result<()> {
        self.ensure_parent()?;
        let content = serde_json::to_string_pretty(tables).map_err(FermeError::Serialization)?;
        fs::write(&self.path, content).map_err(FermeError::Io)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
