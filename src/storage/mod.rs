pub mod book;
pub mod json_backend;

use crate::errors::Result;

pub use book::{GoalBook, BOOK_SCHEMA_VERSION};
pub use json_backend::JsonStorage;

/// Abstraction over persistence backends able to hold a [`GoalBook`].
pub trait StorageBackend: Send + Sync {
    /// Loads the stored book, or an empty one when nothing was saved yet.
    fn load(&self) -> Result<GoalBook>;
    fn save(&self, book: &GoalBook) -> Result<()>;
    /// Writes an explicit snapshot and returns its file name.
    fn backup(&self, book: &GoalBook, note: Option<&str>) -> Result<String>;
    /// Backup names, newest first.
    fn list_backups(&self) -> Result<Vec<String>>;
    /// Replaces the stored book with a backup and returns it.
    fn restore(&self, backup_name: &str) -> Result<GoalBook>;
}
