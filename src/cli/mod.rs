pub mod actions;
pub mod args;
pub mod commands;
pub mod output;
pub mod screen;
pub mod setup;
pub mod surface;

pub use actions::{ActionController, ActionOutcome, ActionPolicy, Finish, InteractionReport};
pub use args::{Cli, InfoAction};
pub use commands::{CommandHandler, QueryOptions};
pub use output::{OutputFormatter, Spinner};
pub use surface::{ActionSurface, CandidateView, Notice};
