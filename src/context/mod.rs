pub mod history;
pub mod storage;

pub use history::{HistoryEntry, HistoryLoad, HistoryStore};
