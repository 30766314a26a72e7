use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<String>, // ISO 8601, stored as text
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub goal_id: Option<i64>,
    pub title: String,
    pub is_done: bool,
    pub energy_level: Option<String>, // low, medium, high
    pub time_estimate: Option<i64>,   // minutes
}

/// A journal record for a calendar date.
///
/// Several entries may share the same `date`: each one is a separate
/// check-in for that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub id: i64,
    pub date: String, // YYYY-MM-DD
    pub energy: Option<String>,
    pub focus: Option<String>,
    pub main_goal: Option<String>,
    pub notes: Option<String>,
    pub energy_level: Option<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub goal_id: Option<i64>,
    pub title: String,
    pub is_done: bool,
    pub energy_level: Option<String>,
    pub time_estimate: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDailyEntry {
    pub date: String,
    pub energy: Option<String>,
    pub focus: Option<String>,
    pub main_goal: Option<String>,
    pub notes: Option<String>,
    pub energy_level: Option<String>,
    pub mood: Option<String>,
}

// Patches: `None` leaves a column untouched, `Some(None)` clears a nullable column.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub created_at: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub goal_id: Option<Option<i64>>,
    pub title: Option<String>,
    pub is_done: Option<bool>,
    pub energy_level: Option<Option<String>>,
    pub time_estimate: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyEntryPatch {
    pub date: Option<String>,
    pub energy: Option<Option<String>>,
    pub focus: Option<Option<String>>,
    pub main_goal: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub energy_level: Option<Option<String>>,
    pub mood: Option<Option<String>>,
}

impl NewGoal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Stamp the goal with the current UTC time.
    pub fn created_now(mut self) -> Self {
        self.created_at = Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        self
    }
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl NewDailyEntry {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.created_at.is_none()
    }
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.goal_id.is_none()
            && self.title.is_none()
            && self.is_done.is_none()
            && self.energy_level.is_none()
            && self.time_estimate.is_none()
    }
}

impl DailyEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.energy.is_none()
            && self.focus.is_none()
            && self.main_goal.is_none()
            && self.notes.is_none()
            && self.energy_level.is_none()
            && self.mood.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patches_are_empty() {
        assert!(GoalPatch::default().is_empty());
        assert!(TaskPatch::default().is_empty());
        assert!(DailyEntryPatch::default().is_empty());
    }

    #[test]
    fn clearing_a_column_is_not_empty() {
        let patch = GoalPatch {
            description: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        let patch = TaskPatch {
            is_done: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn new_task_defaults_to_not_done() {
        let task = NewTask::new("Step 1");
        assert!(!task.is_done);
        assert_eq!(task.goal_id, None);
    }

    #[test]
    fn created_now_sets_timestamp() {
        let goal = NewGoal::new("Ship it").created_now();
        let stamp = goal.created_at.expect("timestamp set");
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
