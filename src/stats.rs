use serde::Serialize;

use crate::database::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: i64,
    pub done: i64,
    pub open: i64,
    /// Minutes still estimated across open tasks
    pub open_minutes: i64,
    pub completion_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub goal_id: i64,
    pub title: String,
    pub total_tasks: i64,
    pub done_tasks: i64,
    pub completion_percent: i64,
}

/// Rounded percentage, 0 for an empty set
pub fn completion_percent(done: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (done as f64 * 100.0 / total as f64).round() as i64
}

/// Count tasks by completion state
pub fn task_summary(db: &Database) -> Result<TaskSummary, DatabaseError> {
    let (total, done, open_minutes): (i64, i64, i64) = db.conn().query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(is_done <> 0), 0),
                COALESCE(SUM(CASE WHEN is_done = 0 THEN time_estimate END), 0)
         FROM tasks",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(TaskSummary {
        total,
        done,
        open: total - done,
        open_minutes,
        completion_percent: completion_percent(done, total),
    })
}

/// Per-goal task completion, in the same order as the goal list
pub fn goal_progress(db: &Database) -> Result<Vec<GoalProgress>, DatabaseError> {
    let mut stmt = db.conn().prepare(
        "SELECT g.id, g.title, COUNT(t.id), COALESCE(SUM(t.is_done <> 0), 0)
         FROM goals g
         LEFT JOIN tasks t ON t.goal_id = g.id
         GROUP BY g.id
         ORDER BY g.created_at DESC, g.id DESC",
    )?;

    let progress = stmt
        .query_map([], |row| {
            let total_tasks: i64 = row.get(2)?;
            let done_tasks: i64 = row.get(3)?;
            Ok(GoalProgress {
                goal_id: row.get(0)?,
                title: row.get(1)?,
                total_tasks,
                done_tasks,
                completion_percent: completion_percent(done_tasks, total_tasks),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(progress)
}
