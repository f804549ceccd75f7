use console::{style, Color};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::context::HistoryEntry;
use crate::utils::ExecutionOutcome;

#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    use_colors: bool,
}

/// Stderr spinner shown while the model is thinking. Hidden automatically
/// when stderr is not a terminal.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "]),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Candidate command with its explanation underneath.
    pub fn format_candidate(&self, command: &str, explanation: Option<&str>) -> String {
        let mut output = String::new();

        if command.is_empty() {
            output.push_str(&self.format_warning("No command generated."));
        } else {
            output.push_str(&self.style_text("Command:", Color::Cyan));
            output.push(' ');
            output.push_str(&self.style_text(command, Color::Green));
        }

        if let Some(explanation) = explanation {
            let explanation = explanation.trim();
            if !explanation.is_empty() {
                output.push('\n');
                output.push_str(&self.style_text(explanation, Color::White));
            }
        }

        output
    }

    pub fn format_execution(&self, outcome: &ExecutionOutcome) -> String {
        match outcome {
            ExecutionOutcome::Completed { exit_code: 0, .. } => {
                self.format_success("Command finished")
            }
            ExecutionOutcome::Completed { exit_code, .. } => {
                self.format_error(&format!("Command exited with code: {exit_code}"))
            }
            ExecutionOutcome::TimedOut { after } => self.format_error(&format!(
                "Command timed out after {}s and was stopped",
                after.as_secs_f32()
            )),
        }
    }

    pub fn format_history(&self, entries: &[HistoryEntry]) -> String {
        if entries.is_empty() {
            return self.format_info("History is empty.");
        }

        let mut output = String::new();
        for (i, entry) in entries.iter().enumerate() {
            let number = format!("{:>3}. ", i + 1);
            output.push_str(&self.style_text(&number, Color::Cyan));
            output.push_str(&entry.query);
            output.push('\n');
            output.push_str("     ");
            output.push_str(&self.style_text(&entry.command, Color::Green));
            if i < entries.len() - 1 {
                output.push('\n');
            }
        }
        output
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("Error:", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Blue), message)
    }

    pub fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
