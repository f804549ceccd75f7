use std::env;
use std::path::Path;
use which::which;

pub struct ShellDetector;

impl ShellDetector {
    /// Shell as reported to the model: `$SHELL`, then `%COMSPEC%`.
    pub fn shell_label() -> String {
        env::var("SHELL")
            .ok()
            .or_else(|| env::var("COMSPEC").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unknown shell".to_string())
    }

    /// Program and flag used to run a command string.
    pub fn invocation() -> (String, &'static str) {
        if cfg!(target_os = "windows") {
            return ("cmd".to_string(), "/C");
        }

        let program = env::var("SHELL")
            .ok()
            .filter(|shell| Self::is_runnable(shell))
            .unwrap_or_else(|| "sh".to_string());
        (program, "-c")
    }

    fn is_runnable(shell: &str) -> bool {
        let path = Path::new(shell);
        if path.is_absolute() {
            path.is_file()
        } else {
            which(shell).is_ok()
        }
    }
}
