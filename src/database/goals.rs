use rusqlite::OptionalExtension;
use tracing::debug;

use super::{Assignments, ChangeKind, Database, DatabaseError, EntityKind, Repository};
use crate::models::{Goal, GoalPatch, NewGoal};

const GOAL_COLUMNS: &str = "id, title, description, created_at";

pub struct GoalRepository<'db> {
    db: &'db Database,
}

impl<'db> GoalRepository<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Helper function to map a row to a Goal
    fn row_to_goal(row: &rusqlite::Row) -> Result<Goal, rusqlite::Error> {
        Ok(Goal {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl Repository for GoalRepository<'_> {
    type Entity = Goal;
    type New = NewGoal;
    type Patch = GoalPatch;

    /// Newest first by `created_at` (text ordering), goals without a timestamp last
    fn fetch_all(&self) -> Result<Vec<Goal>, DatabaseError> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_at DESC, id DESC"
        ))?;
        let goals = stmt
            .query_map([], Self::row_to_goal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    fn get(&self, id: i64) -> Result<Option<Goal>, DatabaseError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"))?;
        let goal = stmt
            .query_row(rusqlite::params![id], Self::row_to_goal)
            .optional()?;
        Ok(goal)
    }

    fn insert(&self, goal: &NewGoal) -> Result<i64, DatabaseError> {
        self.db.conn().execute(
            "INSERT INTO goals (title, description, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![goal.title, goal.description, goal.created_at],
        )?;
        let id = self.db.conn().last_insert_rowid();
        self.db.notify(EntityKind::Goal, id, ChangeKind::Inserted);
        Ok(id)
    }

    fn update(&self, id: i64, patch: &GoalPatch) -> Result<usize, DatabaseError> {
        let mut assignments = Assignments::new();
        if let Some(title) = &patch.title {
            assignments.set("title", title.clone());
        }
        if let Some(description) = &patch.description {
            assignments.set_nullable("description", description.clone());
        }
        if let Some(created_at) = &patch.created_at {
            assignments.set_nullable("created_at", created_at.clone());
        }

        debug!(id, columns = ?assignments.columns(), "updating goal");
        let changed = assignments.apply(self.db.conn(), "goals", id)?;
        if changed > 0 {
            self.db.notify(EntityKind::Goal, id, ChangeKind::Updated);
        }
        Ok(changed)
    }

    /// Delete a goal by ID.
    /// Tasks linked to it are detached (goal_id set to NULL), not deleted.
    fn delete(&self, id: i64) -> Result<usize, DatabaseError> {
        let conn = self.db.conn();
        let tx = conn.unchecked_transaction()?;

        let detached = {
            let mut stmt = tx.prepare("SELECT id FROM tasks WHERE goal_id = ?1")?;
            stmt.query_map(rusqlite::params![id], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?
        };
        tx.execute("UPDATE tasks SET goal_id = NULL WHERE goal_id = ?1", rusqlite::params![id])?;
        let removed = tx.execute("DELETE FROM goals WHERE id = ?1", rusqlite::params![id])?;

        tx.commit()?;

        debug!(id, removed, detached = detached.len(), "deleted goal");
        for task_id in detached {
            self.db.notify(EntityKind::Task, task_id, ChangeKind::Updated);
        }
        if removed > 0 {
            self.db.notify(EntityKind::Goal, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }
}
