use serde::Serialize;
use tracing::info;

use crate::database::{Database, DatabaseError, Repository};
use crate::models::{NewDailyEntry, NewGoal, NewTask};

/// Ids of the rows inserted by one seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub goal_ids: Vec<i64>,
    pub task_ids: Vec<i64>,
    pub daily_entry_ids: Vec<i64>,
}

/// Insert the demo data set.
///
/// Not idempotent: each call appends another copy. Tasks are linked to the
/// ids generated for the goals inserted by this same call.
pub fn seed_sample_data(db: &Database) -> Result<SeedReport, DatabaseError> {
    let mut report = SeedReport::default();

    let mvp = db.goals().insert(&NewGoal {
        title: "Complete AppliGO MVP".to_string(),
        description: Some("Finish the minimal viable product by May 1st, 2025".to_string()),
        created_at: Some("2025-04-10T10:00:00Z".to_string()),
    })?;
    let orm = db.goals().insert(&NewGoal {
        title: "Learn Drizzle ORM".to_string(),
        description: Some("Master Drizzle ORM and SQLite integration".to_string()),
        created_at: Some("2025-04-05T15:30:00Z".to_string()),
    })?;
    report.goal_ids = vec![mvp, orm];

    let tasks = [
        (mvp, "Setup database schema", true, "high", 120),
        (mvp, "Build UI components", false, "medium", 180),
        (orm, "Read Drizzle docs", false, "low", 60),
    ];
    for (goal_id, title, is_done, energy, minutes) in tasks {
        let id = db.tasks().insert(&NewTask {
            goal_id: Some(goal_id),
            title: title.to_string(),
            is_done,
            energy_level: Some(energy.to_string()),
            time_estimate: Some(minutes),
        })?;
        report.task_ids.push(id);
    }

    let entries = [
        NewDailyEntry {
            date: "2025-06-14".to_string(),
            energy: Some("high".to_string()),
            focus: Some("high".to_string()),
            main_goal: Some("Complete AppliGO MVP".to_string()),
            notes: Some("Made great progress on UI and backend integration.".to_string()),
            energy_level: Some("high".to_string()),
            mood: Some("motivated".to_string()),
        },
        NewDailyEntry {
            date: "2025-06-13".to_string(),
            energy: Some("medium".to_string()),
            focus: Some("medium".to_string()),
            main_goal: Some("Learn Drizzle ORM".to_string()),
            notes: Some("Read docs and tested migrations.".to_string()),
            energy_level: Some("medium".to_string()),
            mood: Some("focused".to_string()),
        },
    ];
    for entry in &entries {
        report.daily_entry_ids.push(db.daily_entries().insert(entry)?);
    }

    info!(
        goals = report.goal_ids.len(),
        tasks = report.task_ids.len(),
        daily_entries = report.daily_entry_ids.len(),
        "seeded sample data"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_links_tasks_to_generated_goal_ids() {
        let db = Database::open_in_memory().unwrap();
        let report = seed_sample_data(&db).unwrap();

        assert_eq!(report.goal_ids.len(), 2);
        assert_eq!(report.task_ids.len(), 3);
        assert_eq!(report.daily_entry_ids.len(), 2);

        let mvp = report.goal_ids[0];
        let linked: Vec<String> = db
            .tasks()
            .fetch_for_goal(mvp)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(linked, vec!["Build UI components", "Setup database schema"]);
    }

    #[test]
    fn reseeding_appends_and_relinks() {
        let db = Database::open_in_memory().unwrap();
        let first = seed_sample_data(&db).unwrap();
        let second = seed_sample_data(&db).unwrap();

        assert_eq!(db.goals().fetch_all().unwrap().len(), 4);
        assert_eq!(db.tasks().fetch_all().unwrap().len(), 6);
        assert_eq!(db.daily_entries().fetch_all().unwrap().len(), 4);

        // The second copy points at the second copy's goals, not at ids 1 and 2.
        for task_id in &second.task_ids {
            let task = db.tasks().get(*task_id).unwrap().unwrap();
            let goal_id = task.goal_id.unwrap();
            assert!(second.goal_ids.contains(&goal_id));
            assert!(!first.goal_ids.contains(&goal_id));
        }
    }

    #[test]
    fn seeded_task_state_matches_sample() {
        let db = Database::open_in_memory().unwrap();
        let report = seed_sample_data(&db).unwrap();

        let schema = db.tasks().get(report.task_ids[0]).unwrap().unwrap();
        assert!(schema.is_done);
        assert_eq!(schema.time_estimate, Some(120));
        assert_eq!(schema.energy_level.as_deref(), Some("high"));
    }
}
