//! Forward-only schema migrations.
//!
//! The applied version lives in `PRAGMA user_version`. Each step runs in its
//! own transaction and bumps the version when it commits, so a crash between
//! steps leaves the database at the last completed version.

use rusqlite::Connection;
use tracing::info;

use super::DatabaseError;

/// Highest schema version this build knows how to produce.
pub const SCHEMA_VERSION: i64 = 2;

type Step = fn(&Connection) -> Result<(), DatabaseError>;

const STEPS: [(i64, Step); 2] = [(1, create_core_tables), (2, extend_daily_entries)];

/// Bring the schema up to `SCHEMA_VERSION`.
pub fn run(conn: &Connection) -> Result<(), DatabaseError> {
    let current = user_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DatabaseError::UnsupportedSchema {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    for (version, step) in STEPS {
        if current >= version {
            continue;
        }
        info!(from = current, to = version, "running migration");
        let tx = conn.unchecked_transaction()?;
        step(&tx)?;
        tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
        tx.commit()?;
    }

    Ok(())
}

/// Read the schema version stamped on the database
pub fn user_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn create_core_tables(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS goals (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT,
            created_at      TEXT
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            goal_id         INTEGER,
            title           TEXT NOT NULL,
            is_done         INTEGER DEFAULT 0,
            energy_level    TEXT,
            time_estimate   INTEGER,
            FOREIGN KEY(goal_id) REFERENCES goals(id)
        );

        CREATE TABLE IF NOT EXISTS daily_entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            date            TEXT NOT NULL,
            energy          TEXT,
            focus           TEXT,
            main_goal       TEXT
        );",
    )?;
    Ok(())
}

fn extend_daily_entries(conn: &Connection) -> Result<(), DatabaseError> {
    ensure_column(conn, "daily_entries", "notes", "TEXT")?;
    ensure_column(conn, "daily_entries", "energy_level", "TEXT")?;
    ensure_column(conn, "daily_entries", "mood", "TEXT")?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_tasks_goal_id ON tasks(goal_id);
         CREATE INDEX IF NOT EXISTS idx_daily_entries_date ON daily_entries(date);",
    )?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")?;
    let count: i64 = stmt.query_row(rusqlite::params![table, column], |row| row.get(0))?;
    Ok(count > 0)
}

fn ensure_column(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<(), DatabaseError> {
    if !column_exists(conn, table, column)? {
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl};"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(column_exists(&conn, "daily_entries", "mood").unwrap());
        assert!(column_exists(&conn, "tasks", "goal_id").unwrap());
    }

    #[test]
    fn running_twice_is_harmless() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();
        assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn upgrades_a_version_one_database() {
        let conn = Connection::open_in_memory().unwrap();
        create_core_tables(&conn).unwrap();
        conn.execute_batch("PRAGMA user_version = 1;").unwrap();
        conn.execute("INSERT INTO daily_entries (date, energy) VALUES ('2025-06-13', 'low')", [])
            .unwrap();

        run(&conn).unwrap();

        let (energy, mood): (Option<String>, Option<String>) = conn
            .query_row("SELECT energy, mood FROM daily_entries", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(energy.as_deref(), Some("low"));
        assert_eq!(mood, None);
    }

    #[test]
    fn rejects_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        match run(&conn) {
            Err(DatabaseError::UnsupportedSchema { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected UnsupportedSchema, got {other:?}"),
        }
    }
}
