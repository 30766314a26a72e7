use rusqlite::OptionalExtension;
use tracing::debug;

use super::{Assignments, ChangeKind, Database, DatabaseError, EntityKind, Repository};
use crate::models::{DailyEntry, DailyEntryPatch, NewDailyEntry};

const ENTRY_COLUMNS: &str = "id, date, energy, focus, main_goal, notes, energy_level, mood";

pub struct DailyEntryRepository<'db> {
    db: &'db Database,
}

impl<'db> DailyEntryRepository<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<DailyEntry, rusqlite::Error> {
        Ok(DailyEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            energy: row.get(2)?,
            focus: row.get(3)?,
            main_goal: row.get(4)?,
            notes: row.get(5)?,
            energy_level: row.get(6)?,
            mood: row.get(7)?,
        })
    }

    /// Get every entry recorded for `date`, newest first
    pub fn fetch_for_date(&self, date: &str) -> Result<Vec<DailyEntry>, DatabaseError> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM daily_entries WHERE date = ?1 ORDER BY id DESC"
        ))?;
        let entries = stmt
            .query_map(rusqlite::params![date], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl Repository for DailyEntryRepository<'_> {
    type Entity = DailyEntry;
    type New = NewDailyEntry;
    type Patch = DailyEntryPatch;

    /// Ordered by date DESC as text, then newest first within a date
    fn fetch_all(&self) -> Result<Vec<DailyEntry>, DatabaseError> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM daily_entries ORDER BY date DESC, id DESC"
        ))?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get(&self, id: i64) -> Result<Option<DailyEntry>, DatabaseError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM daily_entries WHERE id = ?1"))?;
        let entry = stmt
            .query_row(rusqlite::params![id], Self::row_to_entry)
            .optional()?;
        Ok(entry)
    }

    fn insert(&self, entry: &NewDailyEntry) -> Result<i64, DatabaseError> {
        self.db.conn().execute(
            "INSERT INTO daily_entries (date, energy, focus, main_goal, notes, energy_level, mood)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                entry.date,
                entry.energy,
                entry.focus,
                entry.main_goal,
                entry.notes,
                entry.energy_level,
                entry.mood
            ],
        )?;
        let id = self.db.conn().last_insert_rowid();
        self.db.notify(EntityKind::DailyEntry, id, ChangeKind::Inserted);
        Ok(id)
    }

    fn update(&self, id: i64, patch: &DailyEntryPatch) -> Result<usize, DatabaseError> {
        let mut assignments = Assignments::new();
        if let Some(date) = &patch.date {
            assignments.set("date", date.clone());
        }

        let nullable = [
            ("energy", &patch.energy),
            ("focus", &patch.focus),
            ("main_goal", &patch.main_goal),
            ("notes", &patch.notes),
            ("energy_level", &patch.energy_level),
            ("mood", &patch.mood),
        ];
        for (column, value) in nullable {
            if let Some(value) = value {
                assignments.set_nullable(column, value.clone());
            }
        }

        debug!(id, columns = ?assignments.columns(), "updating daily entry");
        let changed = assignments.apply(self.db.conn(), "daily_entries", id)?;
        if changed > 0 {
            self.db.notify(EntityKind::DailyEntry, id, ChangeKind::Updated);
        }
        Ok(changed)
    }

    fn delete(&self, id: i64) -> Result<usize, DatabaseError> {
        let tx = self.db.conn().unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM daily_entries WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;

        if removed > 0 {
            self.db.notify(EntityKind::DailyEntry, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }
}
