use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::debug;

use crate::{
    errors::{PlanError, Result},
    utils::{
        fs::{
            ensure_dir, parse_backup_timestamp, sanitize_note, write_atomic, BACKUP_EXTENSION,
            BACKUP_TIMESTAMP_FORMAT,
        },
        paths,
    },
};

use super::{GoalBook, StorageBackend, BOOK_SCHEMA_VERSION};

const DEFAULT_RETENTION: usize = 5;
const BACKUP_PREFIX: &str = "goals";

/// Stores the goal book as pretty-printed JSON, keeping timestamped copies
/// of what each save replaces.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    book_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = root.unwrap_or_else(paths::app_data_dir);
        ensure_dir(&root)?;
        let backups_dir = paths::backup_dir_in(&root);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            book_path: paths::book_file_in(&root),
            backups_dir,
            root,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn book_path(&self) -> &Path {
        &self.book_path
    }

    pub fn backup_path(&self, backup_name: &str) -> PathBuf {
        self.backups_dir.join(backup_name)
    }

    fn next_backup_path(&self, note: Option<&str>) -> PathBuf {
        let mut stem = format!(
            "{}_{}",
            BACKUP_PREFIX,
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut path = self.backup_path(&format!("{}.{}", stem, BACKUP_EXTENSION));
        let mut counter = 2;
        while path.exists() {
            path = self.backup_path(&format!("{}_{}.{}", stem, counter, BACKUP_EXTENSION));
            counter += 1;
        }
        path
    }

    fn backup_existing_file(&self) -> Result<()> {
        if !self.book_path.exists() {
            return Ok(());
        }
        let target = self.next_backup_path(None);
        fs::copy(&self.book_path, &target)?;
        debug!(backup = %target.display(), "backed up previous goal book");
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for entry in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(entry));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self) -> Result<GoalBook> {
        if !self.book_path.exists() {
            return Ok(GoalBook::default());
        }
        load_book_from_path(&self.book_path)
    }

    fn save(&self, book: &GoalBook) -> Result<()> {
        self.backup_existing_file()?;
        save_book_to_path(book, &self.book_path)
    }

    fn backup(&self, book: &GoalBook, note: Option<&str>) -> Result<String> {
        let path = self.next_backup_path(note);
        let json = serde_json::to_string_pretty(book)?;
        write_atomic(&path, &json)?;
        self.prune_backups()?;
        Ok(path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string())
    }

    fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            (parse_backup_timestamp(b), b.as_str()).cmp(&(parse_backup_timestamp(a), a.as_str()))
        });
        Ok(entries)
    }

    fn restore(&self, backup_name: &str) -> Result<GoalBook> {
        let path = self.backup_path(backup_name);
        if !path.exists() {
            return Err(PlanError::StorageError(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let book = load_book_from_path(&path)?;
        self.save(&book)?;
        Ok(book)
    }
}

pub fn save_book_to_path(book: &GoalBook, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(book)?;
    write_atomic(path, &json)
}

pub fn load_book_from_path(path: &Path) -> Result<GoalBook> {
    let data = fs::read_to_string(path)?;
    let book: GoalBook = serde_json::from_str(&data)?;
    if book.schema_version > BOOK_SCHEMA_VERSION {
        return Err(PlanError::StorageError(format!(
            "goal book `{}` is from a newer schema version ({})",
            path.display(),
            book.schema_version
        )));
    }
    Ok(book)
}
