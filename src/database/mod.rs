use rusqlite::Connection;
use rusqlite::types::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info};

mod daily_entries;
mod goals;
pub mod migrations;
mod repository;
mod tasks;

pub use daily_entries::DailyEntryRepository;
pub use goals::GoalRepository;
pub use repository::Repository;
pub use tasks::TaskRepository;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Goal {0} does not exist")]
    GoalNotFound(i64),
    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Goal,
    Task,
    DailyEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A committed mutation, delivered to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub entity: EntityKind,
    pub id: i64,
    pub kind: ChangeKind,
}

pub struct Database {
    conn: Connection,
    subscribers: RefCell<Vec<Sender<Change>>>,
}

impl Database {
    /// Open (or create) the database file and bring the schema up to date
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path.as_ref());

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!(path = %db_path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database with the full schema
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        // Foreign keys are off by default in SQLite and must be enabled per connection
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run(&conn)?;

        Ok(Database {
            conn,
            subscribers: RefCell::new(Vec::new()),
        })
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn goals(&self) -> GoalRepository<'_> {
        GoalRepository::new(self)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(self)
    }

    pub fn daily_entries(&self) -> DailyEntryRepository<'_> {
        DailyEntryRepository::new(self)
    }

    /// Register for change notifications.
    ///
    /// Every successful insert, update (that touched a row) and delete (that
    /// removed a row) is sent to each live receiver. Dropped receivers are
    /// pruned on the next notification.
    pub fn subscribe(&self) -> Receiver<Change> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub(crate) fn notify(&self, entity: EntityKind, id: i64, kind: ChangeKind) {
        let change = Change { entity, id, kind };
        debug!(?entity, id, ?kind, "store changed");
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(change).is_ok());
    }

    /// Whether a goal with this id exists
    pub fn goal_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM goals WHERE id = ?1)",
            rusqlite::params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

/// Column assignments collected from a patch, turned into one `UPDATE`.
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.columns.push(column);
        self.values.push(value.into());
    }

    pub(crate) fn set_nullable<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) {
        self.set(column, value.map(Into::into).unwrap_or(Value::Null));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Run `UPDATE <table> SET ... WHERE id = ?` in its own transaction.
    /// Returns the number of rows changed; an empty set of assignments is a no-op.
    pub(crate) fn apply(self, conn: &Connection, table: &str, id: i64) -> Result<usize, DatabaseError> {
        if self.is_empty() {
            return Ok(0);
        }

        let set_clause = self
            .columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {table} SET {set_clause} WHERE id = ?");

        let mut values = self.values;
        values.push(Value::Integer(id));

        let tx = conn.unchecked_transaction()?;
        let changed = tx.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        tx.commit()?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewGoal;

    #[test]
    fn open_in_memory_enables_foreign_keys() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn new_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let db = Database::new(&path).unwrap();
        assert!(path.exists());
        assert!(db.goals().fetch_all().unwrap().is_empty());
    }

    #[test]
    fn subscribers_receive_changes() {
        let db = Database::open_in_memory().unwrap();
        let rx = db.subscribe();

        let id = db.goals().insert(&NewGoal::new("Read more")).unwrap();
        db.goals().delete(id).unwrap();

        let changes: Vec<Change> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                Change { entity: EntityKind::Goal, id, kind: ChangeKind::Inserted },
                Change { entity: EntityKind::Goal, id, kind: ChangeKind::Deleted },
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let db = Database::open_in_memory().unwrap();
        drop(db.subscribe());
        let live = db.subscribe();

        db.goals().insert(&NewGoal::new("One")).unwrap();

        assert_eq!(db.subscribers.borrow().len(), 1);
        assert_eq!(live.try_iter().count(), 1);
    }

    #[test]
    fn goal_exists_reflects_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.goal_exists(1).unwrap());
        let id = db.goals().insert(&NewGoal::new("Exists")).unwrap();
        assert!(db.goal_exists(id).unwrap());
    }

    #[test]
    fn empty_assignments_touch_nothing() {
        let db = Database::open_in_memory().unwrap();
        let changed = Assignments::new().apply(db.conn(), "goals", 1).unwrap();
        assert_eq!(changed, 0);
    }
}
