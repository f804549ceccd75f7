pub mod ai;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod utils;

pub use cli::{Cli, CommandHandler, Finish, QueryOptions};
pub use config::Settings;
pub use context::{HistoryEntry, HistoryStore};
