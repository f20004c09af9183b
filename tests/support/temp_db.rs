use tempfile::TempDir;

use tradelog::adapter::sqlite::SqliteStore;

/// SQLite database in a temporary directory, removed on drop.
pub struct TempDb {
    dir: TempDir,
}

impl TempDb {
    pub fn create() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> String {
        self.dir.path().join("journal.db").display().to_string()
    }

    /// Open (or reopen) the store; migrations run on every open.
    pub fn open(&self) -> SqliteStore {
        SqliteStore::open(&self.path()).expect("open sqlite store")
    }
}
