use rusqlite::OptionalExtension;
use tracing::debug;

use super::{Assignments, ChangeKind, Database, DatabaseError, EntityKind, Repository};
use crate::models::{NewTask, Task, TaskPatch};

const TASK_COLUMNS: &str = "id, goal_id, title, is_done, energy_level, time_estimate";

pub struct TaskRepository<'db> {
    db: &'db Database,
}

impl<'db> TaskRepository<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: row.get(0)?,
            goal_id: row.get(1)?,
            title: row.get(2)?,
            is_done: row.get::<_, Option<i64>>(3)?.unwrap_or(0) != 0,
            energy_level: row.get(4)?,
            time_estimate: row.get(5)?,
        })
    }

    fn ensure_goal(&self, goal_id: i64) -> Result<(), DatabaseError> {
        if self.db.goal_exists(goal_id)? {
            Ok(())
        } else {
            Err(DatabaseError::GoalNotFound(goal_id))
        }
    }

    /// Get the tasks linked to one goal, newest first
    pub fn fetch_for_goal(&self, goal_id: i64) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE goal_id = ?1 ORDER BY id DESC"
        ))?;
        let tasks = stmt
            .query_map(rusqlite::params![goal_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Mark a task done or not done
    pub fn set_done(&self, id: i64, done: bool) -> Result<usize, DatabaseError> {
        self.update(
            id,
            &TaskPatch {
                is_done: Some(done),
                ..Default::default()
            },
        )
    }
}

impl Repository for TaskRepository<'_> {
    type Entity = Task;
    type New = NewTask;
    type Patch = TaskPatch;

    /// Newest first by id
    fn fetch_all(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC"))?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn get(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        let task = stmt
            .query_row(rusqlite::params![id], Self::row_to_task)
            .optional()?;
        Ok(task)
    }

    fn insert(&self, task: &NewTask) -> Result<i64, DatabaseError> {
        if let Some(goal_id) = task.goal_id {
            self.ensure_goal(goal_id)?;
        }

        self.db.conn().execute(
            "INSERT INTO tasks (goal_id, title, is_done, energy_level, time_estimate)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                task.goal_id,
                task.title,
                if task.is_done { 1 } else { 0 },
                task.energy_level,
                task.time_estimate
            ],
        )?;
        let id = self.db.conn().last_insert_rowid();
        self.db.notify(EntityKind::Task, id, ChangeKind::Inserted);
        Ok(id)
    }

    fn update(&self, id: i64, patch: &TaskPatch) -> Result<usize, DatabaseError> {
        let mut assignments = Assignments::new();
        if let Some(goal_id) = patch.goal_id {
            if let Some(goal_id) = goal_id {
                self.ensure_goal(goal_id)?;
            }
            assignments.set_nullable("goal_id", goal_id);
        }
        if let Some(title) = &patch.title {
            assignments.set("title", title.clone());
        }
        if let Some(done) = patch.is_done {
            assignments.set("is_done", if done { 1_i64 } else { 0 });
        }
        if let Some(energy_level) = &patch.energy_level {
            assignments.set_nullable("energy_level", energy_level.clone());
        }
        if let Some(time_estimate) = patch.time_estimate {
            assignments.set_nullable("time_estimate", time_estimate);
        }

        debug!(id, columns = ?assignments.columns(), "updating task");
        let changed = assignments.apply(self.db.conn(), "tasks", id)?;
        if changed > 0 {
            self.db.notify(EntityKind::Task, id, ChangeKind::Updated);
        }
        Ok(changed)
    }

    fn delete(&self, id: i64) -> Result<usize, DatabaseError> {
        let tx = self.db.conn().unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;

        if removed > 0 {
            self.db.notify(EntityKind::Task, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }
}
