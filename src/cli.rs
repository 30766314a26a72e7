use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::database::{Database, DatabaseError, Repository};
use crate::models::{DailyEntry, DailyEntryPatch, Goal, GoalPatch, NewDailyEntry, NewGoal, NewTask, Task, TaskPatch};
use crate::utils::{get_current_date_string, parse_date};
use crate::{seed, stats};

#[derive(Parser)]
#[command(name = "appligo")]
#[command(about = "Goals, tasks and daily entries in a local SQLite store")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage daily entries
    #[command(subcommand)]
    Entry(EntryCommand),
    /// Insert the sample data set (appends on every run)
    Seed,
    /// Show task completion and per-goal progress
    Stats,
}

#[derive(Subcommand)]
pub enum GoalCommand {
    /// List goals, newest first
    List,
    /// Add a goal
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Creation timestamp (defaults to now)
        #[arg(long)]
        created_at: Option<String>,
    },
    /// Change some fields of a goal
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        created_at: Option<String>,
        /// Set a nullable field to empty (description, created-at)
        #[arg(long, value_name = "FIELD")]
        clear: Vec<String>,
    },
    /// Delete a goal; its tasks are kept and unlinked
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks, newest first
    List {
        /// Only tasks linked to this goal
        #[arg(long)]
        goal: Option<i64>,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        goal: Option<i64>,
        #[arg(long)]
        done: bool,
        /// Energy label: low, medium, high
        #[arg(long)]
        energy: Option<String>,
        /// Estimate in minutes
        #[arg(long)]
        estimate: Option<i64>,
    },
    /// Change some fields of a task
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        goal: Option<i64>,
        #[arg(long)]
        done: Option<bool>,
        #[arg(long)]
        energy: Option<String>,
        #[arg(long)]
        estimate: Option<i64>,
        /// Set a nullable field to empty (goal, energy, estimate)
        #[arg(long, value_name = "FIELD")]
        clear: Vec<String>,
    },
    /// Mark a task as done
    Done { id: i64 },
    /// Mark a task as not done
    Undo { id: i64 },
    /// Delete a task
    Delete { id: i64 },
}

#[derive(Args)]
pub struct EntryFields {
    #[arg(long)]
    pub energy: Option<String>,
    #[arg(long)]
    pub focus: Option<String>,
    #[arg(long)]
    pub main_goal: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub energy_level: Option<String>,
    #[arg(long)]
    pub mood: Option<String>,
}

#[derive(Subcommand)]
pub enum EntryCommand {
    /// List daily entries, latest date first
    List {
        /// Only entries for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Add a daily entry
    Add {
        /// Entry date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        fields: EntryFields,
    },
    /// Change some fields of a daily entry
    Update {
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        fields: EntryFields,
        /// Set a nullable field to empty (energy, focus, main-goal, notes, energy-level, mood)
        #[arg(long, value_name = "FIELD")]
        clear: Vec<String>,
    },
    /// Delete a daily entry
    Delete { id: i64 },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Field cannot be cleared: {0}")]
    UnknownField(String),
    #[error("Failed to write output: {0}")]
    OutputError(#[from] std::io::Error),
    #[error("Failed to encode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Execute one command against an open database, writing results to `out`
pub fn run(command: Commands, db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Commands::Goal(command) => handle_goal(command, db, json, out),
        Commands::Task(command) => handle_task(command, db, json, out),
        Commands::Entry(command) => handle_entry(command, db, json, out),
        Commands::Seed => handle_seed(db, json, out),
        Commands::Stats => handle_stats(db, json, out),
    }
}

fn handle_goal(command: GoalCommand, db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        GoalCommand::List => {
            let goals = db.goals().fetch_all()?;
            if json {
                return write_json(out, &goals);
            }
            for goal in &goals {
                writeln!(out, "{}", format_goal(goal))?;
            }
        }
        GoalCommand::Add { title, description, created_at } => {
            let mut goal = NewGoal { title, description, created_at };
            if goal.created_at.is_none() {
                goal = goal.created_now();
            }
            let id = db.goals().insert(&goal)?;
            report_created(out, json, "Goal", id)?;
        }
        GoalCommand::Update { id, title, description, created_at, clear } => {
            let mut patch = GoalPatch {
                title,
                description: description.map(Some),
                created_at: created_at.map(Some),
            };
            for field in clear {
                match field.as_str() {
                    "description" => patch.description = Some(None),
                    "created-at" | "created_at" => patch.created_at = Some(None),
                    _ => return Err(CliError::UnknownField(field.clone())),
                }
            }
            let changed = db.goals().update(id, &patch)?;
            report_changed(out, json, "Goal", id, "updated", changed)?;
        }
        GoalCommand::Delete { id } => {
            let removed = db.goals().delete(id)?;
            report_changed(out, json, "Goal", id, "deleted", removed)?;
        }
    }
    Ok(())
}

fn handle_task(command: TaskCommand, db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        TaskCommand::List { goal } => {
            let tasks = match goal {
                Some(goal_id) => db.tasks().fetch_for_goal(goal_id)?,
                None => db.tasks().fetch_all()?,
            };
            if json {
                return write_json(out, &tasks);
            }
            for task in &tasks {
                writeln!(out, "{}", format_task(task))?;
            }
        }
        TaskCommand::Add { title, goal, done, energy, estimate } => {
            let task = NewTask {
                goal_id: goal,
                title,
                is_done: done,
                energy_level: energy,
                time_estimate: estimate,
            };
            let id = db.tasks().insert(&task)?;
            report_created(out, json, "Task", id)?;
        }
        TaskCommand::Update { id, title, goal, done, energy, estimate, clear } => {
            let mut patch = TaskPatch {
                goal_id: goal.map(Some),
                title,
                is_done: done,
                energy_level: energy.map(Some),
                time_estimate: estimate.map(Some),
            };
            for field in clear {
                match field.as_str() {
                    "goal" => patch.goal_id = Some(None),
                    "energy" => patch.energy_level = Some(None),
                    "estimate" => patch.time_estimate = Some(None),
                    _ => return Err(CliError::UnknownField(field.clone())),
                }
            }
            let changed = db.tasks().update(id, &patch)?;
            report_changed(out, json, "Task", id, "updated", changed)?;
        }
        TaskCommand::Done { id } => {
            let changed = db.tasks().set_done(id, true)?;
            report_changed(out, json, "Task", id, "marked done", changed)?;
        }
        TaskCommand::Undo { id } => {
            let changed = db.tasks().set_done(id, false)?;
            report_changed(out, json, "Task", id, "reopened", changed)?;
        }
        TaskCommand::Delete { id } => {
            let removed = db.tasks().delete(id)?;
            report_changed(out, json, "Task", id, "deleted", removed)?;
        }
    }
    Ok(())
}

fn handle_entry(command: EntryCommand, db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        EntryCommand::List { date } => {
            let entries = match date {
                Some(date) => db.daily_entries().fetch_for_date(&validated_date(date)?)?,
                None => db.daily_entries().fetch_all()?,
            };
            if json {
                return write_json(out, &entries);
            }
            for entry in &entries {
                writeln!(out, "{}", format_entry(entry))?;
            }
        }
        EntryCommand::Add { date, fields } => {
            let date = match date {
                Some(date) => validated_date(date)?,
                None => get_current_date_string(),
            };
            let entry = NewDailyEntry {
                date,
                energy: fields.energy,
                focus: fields.focus,
                main_goal: fields.main_goal,
                notes: fields.notes,
                energy_level: fields.energy_level,
                mood: fields.mood,
            };
            let id = db.daily_entries().insert(&entry)?;
            report_created(out, json, "Daily entry", id)?;
        }
        EntryCommand::Update { id, date, fields, clear } => {
            let mut patch = DailyEntryPatch {
                date: date.map(validated_date).transpose()?,
                energy: fields.energy.map(Some),
                focus: fields.focus.map(Some),
                main_goal: fields.main_goal.map(Some),
                notes: fields.notes.map(Some),
                energy_level: fields.energy_level.map(Some),
                mood: fields.mood.map(Some),
            };
            for field in clear {
                let slot = match field.as_str() {
                    "energy" => &mut patch.energy,
                    "focus" => &mut patch.focus,
                    "main-goal" | "main_goal" => &mut patch.main_goal,
                    "notes" => &mut patch.notes,
                    "energy-level" | "energy_level" => &mut patch.energy_level,
                    "mood" => &mut patch.mood,
                    _ => return Err(CliError::UnknownField(field.clone())),
                };
                *slot = Some(None);
            }
            let changed = db.daily_entries().update(id, &patch)?;
            report_changed(out, json, "Daily entry", id, "updated", changed)?;
        }
        EntryCommand::Delete { id } => {
            let removed = db.daily_entries().delete(id)?;
            report_changed(out, json, "Daily entry", id, "deleted", removed)?;
        }
    }
    Ok(())
}

fn handle_seed(db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    let report = seed::seed_sample_data(db)?;
    if json {
        return write_json(out, &report);
    }
    writeln!(
        out,
        "Inserted {} goals, {} tasks and {} daily entries",
        report.goal_ids.len(),
        report.task_ids.len(),
        report.daily_entry_ids.len()
    )?;
    Ok(())
}

fn handle_stats(db: &Database, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    let summary = stats::task_summary(db)?;
    let progress = stats::goal_progress(db)?;
    if json {
        return write_json(out, &serde_json::json!({ "tasks": summary, "goals": progress }));
    }

    writeln!(
        out,
        "Tasks: {}/{} done ({}%), {} open, {} min remaining",
        summary.done, summary.total, summary.completion_percent, summary.open, summary.open_minutes
    )?;
    for goal in &progress {
        writeln!(
            out,
            "[{}] {}: {}/{} ({}%)",
            goal.goal_id, goal.title, goal.done_tasks, goal.total_tasks, goal.completion_percent
        )?;
    }
    Ok(())
}

fn validated_date(date: String) -> Result<String, CliError> {
    parse_date(&date).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", date, e)))?;
    Ok(date)
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), CliError> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn report_created(out: &mut impl Write, json: bool, what: &str, id: i64) -> Result<(), CliError> {
    if json {
        return write_json(out, &serde_json::json!({ "id": id }));
    }
    writeln!(out, "{} created successfully (ID: {})", what, id)?;
    Ok(())
}

fn report_changed(
    out: &mut impl Write,
    json: bool,
    what: &str,
    id: i64,
    verb: &str,
    rows: usize,
) -> Result<(), CliError> {
    if json {
        return write_json(out, &serde_json::json!({ "id": id, "rows": rows }));
    }
    if rows == 0 {
        writeln!(out, "Nothing changed for {} {}", what.to_lowercase(), id)?;
    } else {
        writeln!(out, "{} {} {}", what, id, verb)?;
    }
    Ok(())
}

fn format_goal(goal: &Goal) -> String {
    let mut line = format!("[{}] {}", goal.id, goal.title);
    if let Some(created_at) = &goal.created_at {
        line.push_str(&format!("  ({})", created_at));
    }
    if let Some(description) = &goal.description {
        line.push_str(&format!("\n    {}", description));
    }
    line
}

fn format_task(task: &Task) -> String {
    let mark = if task.is_done { "x" } else { " " };
    let mut line = format!("[{}] [{}] {}", task.id, mark, task.title);
    if let Some(goal_id) = task.goal_id {
        line.push_str(&format!("  goal:{}", goal_id));
    }
    if let Some(energy) = &task.energy_level {
        line.push_str(&format!("  energy:{}", energy));
    }
    if let Some(minutes) = task.time_estimate {
        line.push_str(&format!("  {}m", minutes));
    }
    line
}

fn format_entry(entry: &DailyEntry) -> String {
    let mut line = format!("[{}] {}", entry.id, entry.date);
    let labelled = [
        ("energy", &entry.energy),
        ("focus", &entry.focus),
        ("mood", &entry.mood),
        ("main goal", &entry.main_goal),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            line.push_str(&format!("  {}:{}", label, value));
        }
    }
    if let Some(notes) = &entry.notes {
        line.push_str(&format!("\n    {}", notes));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(db: &Database, args: &[&str]) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("appligo").chain(args.iter().copied()))
            .expect("arguments parse");
        let mut out = Vec::new();
        run(cli.command, db, cli.json, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn add_and_list_goals() {
        let db = Database::open_in_memory().unwrap();
        let created = exec(&db, &["goal", "add", "Learn X", "--description", "desc", "--created-at", "2025-01-01"])
            .unwrap();
        assert!(created.starts_with("Goal created successfully (ID: "));

        let listed = exec(&db, &["goal", "list"]).unwrap();
        assert!(listed.contains("Learn X  (2025-01-01)"));
        assert!(listed.contains("    desc"));
    }

    #[test]
    fn goal_add_stamps_creation_time_by_default() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["goal", "add", "Stamped"]).unwrap();
        let goal = db.goals().fetch_all().unwrap().remove(0);
        assert!(goal.created_at.is_some());
    }

    #[test]
    fn task_done_and_json_listing() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["task", "add", "Step 1", "--energy", "low", "--estimate", "30"]).unwrap();
        let id = db.tasks().fetch_all().unwrap()[0].id;

        exec(&db, &["task", "done", &id.to_string()]).unwrap();

        let listed = exec(&db, &["task", "list", "--json"]).unwrap();
        let tasks: Vec<Task> = serde_json::from_str(&listed).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_done);
        assert_eq!(tasks[0].time_estimate, Some(30));
    }

    #[test]
    fn task_add_with_unknown_goal_fails() {
        let db = Database::open_in_memory().unwrap();
        let err = exec(&db, &["task", "add", "Orphan", "--goal", "9"]).unwrap_err();
        assert!(matches!(err, CliError::DatabaseError(DatabaseError::GoalNotFound(9))));
    }

    #[test]
    fn task_update_can_clear_fields() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["task", "add", "Trim", "--energy", "high", "--estimate", "45"]).unwrap();
        let id = db.tasks().fetch_all().unwrap()[0].id.to_string();

        exec(&db, &["task", "update", &id, "--clear", "energy", "--clear", "estimate"]).unwrap();

        let task = db.tasks().fetch_all().unwrap().remove(0);
        assert_eq!(task.energy_level, None);
        assert_eq!(task.time_estimate, None);
        assert_eq!(task.title, "Trim");
    }

    #[test]
    fn clearing_an_unknown_field_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = exec(&db, &["goal", "update", "1", "--clear", "title"]).unwrap_err();
        assert!(matches!(err, CliError::UnknownField(field) if field == "title"));
    }

    #[test]
    fn entry_add_validates_date() {
        let db = Database::open_in_memory().unwrap();
        let err = exec(&db, &["entry", "add", "--date", "yesterday"]).unwrap_err();
        assert!(matches!(err, CliError::DateParseError(_)));

        exec(&db, &["entry", "add", "--date", "2025-06-14", "--mood", "calm"]).unwrap();
        let listed = exec(&db, &["entry", "list", "--date", "2025-06-14"]).unwrap();
        assert!(listed.contains("2025-06-14"));
        assert!(listed.contains("mood:calm"));
    }

    #[test]
    fn entry_add_defaults_to_today() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["entry", "add", "--notes", "quick check-in"]).unwrap();
        let entry = db.daily_entries().fetch_all().unwrap().remove(0);
        assert_eq!(entry.date, get_current_date_string());
        assert_eq!(entry.notes.as_deref(), Some("quick check-in"));
    }

    #[test]
    fn update_of_missing_row_reports_nothing_changed() {
        let db = Database::open_in_memory().unwrap();
        let output = exec(&db, &["goal", "update", "5", "--title", "ghost"]).unwrap();
        assert_eq!(output.trim(), "Nothing changed for goal 5");
    }

    #[test]
    fn seed_then_stats() {
        let db = Database::open_in_memory().unwrap();
        let seeded = exec(&db, &["seed"]).unwrap();
        assert_eq!(seeded.trim(), "Inserted 2 goals, 3 tasks and 2 daily entries");

        let output = exec(&db, &["stats"]).unwrap();
        assert!(output.starts_with("Tasks: 1/3 done (33%), 2 open, 240 min remaining"));
        assert!(output.contains("Complete AppliGO MVP: 1/2 (50%)"));
    }
}
