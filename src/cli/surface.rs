use anyhow::Result;
use console::Color;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::io::{self, Write};

use crate::ai::Query;
use crate::cli::actions::ActionOutcome;
use crate::cli::output::OutputFormatter;
use crate::context::HistoryEntry;
use crate::utils::ExecutionOutcome;

/// Everything a surface needs to show the current candidate.
pub struct CandidateView<'a> {
    pub query: &'a Query,
    pub command: &'a str,
    pub explanation: Option<&'a str>,
    /// Actions valid for this candidate, in menu order.
    pub available: &'a [ActionOutcome],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Print the command itself so the user can copy it by hand.
    ShowCommand(String),
    Execution(ExecutionOutcome),
}

/// A way of showing a candidate and asking the user what to do with it.
pub trait ActionSurface {
    fn present(&mut self, view: &CandidateView<'_>) -> Result<ActionOutcome>;

    /// `None` keeps the current command.
    fn edit_command(&mut self, current: &str) -> Result<Option<String>>;

    /// `None` abandons the refinement.
    fn refine_query(&mut self, current: &Query) -> Result<Option<String>>;

    fn choose_history(&mut self, entries: &[HistoryEntry]) -> Result<Option<usize>>;

    fn notify(&mut self, notice: Notice);
}

/// Status messages go to stderr; captured child output goes back to the
/// stream it came from.
pub(crate) fn render_notice(formatter: &OutputFormatter, notice: Notice) {
    match notice {
        Notice::Info(msg) => eprintln!("{}", formatter.format_info(&msg)),
        Notice::Success(msg) => eprintln!("{}", formatter.format_success(&msg)),
        Notice::Warning(msg) => eprintln!("{}", formatter.format_warning(&msg)),
        Notice::Error(msg) => eprintln!("{}", formatter.format_error(&msg)),
        Notice::ShowCommand(command) => eprintln!("{command}"),
        Notice::Execution(outcome) => {
            if let ExecutionOutcome::Completed { stdout, stderr, .. } = &outcome {
                let _ = io::stdout().write_all(stdout);
                let _ = io::stdout().flush();
                let _ = io::stderr().write_all(stderr);
            }
            eprintln!("{}", formatter.format_execution(&outcome));
        }
    }
}

pub(crate) fn history_labels(formatter: &OutputFormatter, entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}",
                entry.query,
                formatter.style_text(&format!("→ {}", entry.command), Color::Green)
            )
        })
        .collect()
}

pub(crate) fn prompt_text(prompt: &str, initial: &str) -> Result<Option<String>> {
    let text: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Line-oriented menu on stderr, used when the terminal cannot host the
/// full-screen surface.
pub struct PlainSurface {
    formatter: OutputFormatter,
}

impl PlainSurface {
    pub fn new(formatter: OutputFormatter) -> Self {
        Self { formatter }
    }
}

impl ActionSurface for PlainSurface {
    fn present(&mut self, view: &CandidateView<'_>) -> Result<ActionOutcome> {
        eprintln!();
        eprintln!(
            "{}",
            self.formatter.format_candidate(view.command, view.explanation)
        );

        let items: Vec<&str> = view.available.iter().map(|a| a.label()).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What next?")
            .items(&items)
            .default(0)
            .interact_opt()?;

        Ok(choice
            .and_then(|i| view.available.get(i).copied())
            .unwrap_or(ActionOutcome::Cancel))
    }

    fn edit_command(&mut self, current: &str) -> Result<Option<String>> {
        prompt_text("Command", current)
    }

    fn refine_query(&mut self, current: &Query) -> Result<Option<String>> {
        prompt_text("Refine request", current.as_str())
    }

    fn choose_history(&mut self, entries: &[HistoryEntry]) -> Result<Option<usize>> {
        let items = history_labels(&self.formatter, entries);
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Pick a previous command")
            .items(&items)
            .default(entries.len().saturating_sub(1))
            .interact_opt()?;
        Ok(choice)
    }

    fn notify(&mut self, notice: Notice) {
        render_notice(&self.formatter, notice);
    }
}

/// No prompting at all: the command goes to stdout and the action chosen
/// on the command line, if any, is taken once.
pub struct NonInteractiveSurface {
    formatter: OutputFormatter,
    planned: Option<ActionOutcome>,
    shown: bool,
}

impl NonInteractiveSurface {
    pub fn new(formatter: OutputFormatter, planned: Option<ActionOutcome>) -> Self {
        Self {
            formatter,
            planned,
            shown: false,
        }
    }
}

impl ActionSurface for NonInteractiveSurface {
    fn present(&mut self, view: &CandidateView<'_>) -> Result<ActionOutcome> {
        if !self.shown {
            self.shown = true;
            if view.command.is_empty() {
                eprintln!("{}", self.formatter.format_warning("No command generated."));
            } else {
                println!("{}", view.command);
            }
            if let Some(explanation) = view.explanation.map(str::trim) {
                if !explanation.is_empty() {
                    eprintln!("{}", self.formatter.style_text(explanation, Color::White));
                }
            }
        }

        Ok(self.planned.take().unwrap_or(ActionOutcome::Cancel))
    }

    fn edit_command(&mut self, _current: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn refine_query(&mut self, _current: &Query) -> Result<Option<String>> {
        Ok(None)
    }

    fn choose_history(&mut self, _entries: &[HistoryEntry]) -> Result<Option<usize>> {
        Ok(None)
    }

    fn notify(&mut self, notice: Notice) {
        render_notice(&self.formatter, notice);
    }
}
