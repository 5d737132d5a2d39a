use std::fs;
use std::path::{Path, PathBuf};
use crate::core::error::Result;

/// Directory structure of one database
#[derive(Debug, Clone)]
pub struct DbLayout {
    pub db_dir: PathBuf,    // <storage>/<name>
}

impl DbLayout {
    /// Creates a fresh database directory, dropping any stale one first.
    pub fn create(storage_path: &Path, name: &str) -> Result<Self> {
        let db_dir = storage_path.join(name);
        if db_dir.exists() {
            fs::remove_dir_all(&db_dir)?;
        }
        fs::create_dir_all(&db_dir)?;
        Ok(DbLayout { db_dir })
    }

    pub fn table_path(&self) -> PathBuf {
        self.db_dir.join("tbl")
    }

    pub fn texts_path(&self) -> PathBuf {
        self.db_dir.join("txt")
    }

    pub fn values_path(&self) -> PathBuf {
        self.db_dir.join("atv")
    }

    pub fn sizes_path(&self) -> PathBuf {
        self.db_dir.join("tmp")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.db_dir.join("meta")
    }

    /// Removes the database directory and everything in it.
    pub fn drop_db(&self) -> Result<()> {
        if self.db_dir.exists() {
            fs::remove_dir_all(&self.db_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_replaces_stale_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DbLayout::create(dir.path(), "db").unwrap();
        fs::write(layout.table_path(), b"stale").unwrap();

        let layout = DbLayout::create(dir.path(), "db").unwrap();
        assert!(layout.db_dir.exists());
        assert!(!layout.table_path().exists());

        layout.drop_db().unwrap();
        assert!(!layout.db_dir.exists());
        // dropping twice is fine
        layout.drop_db().unwrap();
    }
}
