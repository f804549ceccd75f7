pub mod clipboard;
pub mod environment;
pub mod process;
pub mod shell;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use environment::{EnvironmentDetector, PlatformContext};
pub use process::{ExecutionOutcome, ShellExecutor, SystemShell};
pub use shell::ShellDetector;
