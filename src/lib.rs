pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod seed;
pub mod stats;
pub mod utils;

pub use config::Config;
pub use database::{Change, ChangeKind, Database, DatabaseError, EntityKind, Repository};
pub use models::{DailyEntry, Goal, Task};
pub use utils::Profile;
