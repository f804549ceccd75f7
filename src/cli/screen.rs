use anyhow::Result;
use console::Color;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

use crate::ai::Query;
use crate::cli::actions::ActionOutcome;
use crate::cli::output::OutputFormatter;
use crate::cli::surface::{
    history_labels, prompt_text, render_notice, ActionSurface, CandidateView, Notice,
};
use crate::context::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyResult {
    Moved,
    Chosen(usize),
    Hotkey(ActionOutcome),
    Dismissed,
    Ignored,
}

/// Full-screen menu on the alternate screen. Text entry and notices happen
/// on the normal screen once the menu has been left.
pub struct FullScreenSurface {
    formatter: OutputFormatter,
}

/// Restores the terminal even when the menu loop bails out early.
struct AlternateScreen;

impl AlternateScreen {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stderr(), EnterAlternateScreen, cursor::Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for AlternateScreen {
    fn drop(&mut self) {
        let _ = execute!(io::stderr(), cursor::Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

impl FullScreenSurface {
    pub fn new(formatter: OutputFormatter) -> Self {
        Self { formatter }
    }

    /// Runs one menu until something is chosen or it is dismissed.
    fn select(
        &self,
        header: &[String],
        items: &[String],
        initial: usize,
        hotkeys: &[ActionOutcome],
    ) -> Result<KeyResult> {
        let _screen = AlternateScreen::enter()?;
        let mut stderr = io::stderr();
        let mut selected = initial.min(items.len().saturating_sub(1));

        loop {
            self.render_menu(&mut stderr, header, items, selected)?;

            if let Event::Key(key_event) = event::read()? {
                match handle_key_input(key_event, &mut selected, items.len(), hotkeys) {
                    KeyResult::Moved | KeyResult::Ignored => continue,
                    done => return Ok(done),
                }
            }
        }
    }

    fn render_menu(
        &self,
        out: &mut impl Write,
        header: &[String],
        items: &[String],
        selected: usize,
    ) -> io::Result<()> {
        queue!(
            out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;

        for line in header {
            queue!(out, Print(line), Print("\r\n"))?;
        }
        queue!(out, Print("\r\n"))?;

        for (i, item) in items.iter().enumerate() {
            let line = if i == selected {
                format!("▶ {}", self.formatter.style_text(item, Color::Green))
            } else {
                format!("  {item}")
            };
            queue!(out, Print(line), Print("\r\n"))?;
        }

        out.flush()
    }

    fn candidate_header(&self, view: &CandidateView<'_>) -> Vec<String> {
        let mut header = vec![
            format!(
                "{} {}",
                self.formatter.style_text("Request:", Color::Cyan),
                view.query
            ),
            String::new(),
        ];

        if view.command.is_empty() {
            header.push(self.formatter.format_warning("No command generated."));
        } else {
            header.push(format!(
                "  {}",
                self.formatter.style_text(view.command, Color::Green)
            ));
        }

        if let Some(explanation) = view.explanation.map(str::trim) {
            if !explanation.is_empty() {
                header.push(String::new());
                header.extend(explanation.lines().map(str::to_string));
            }
        }

        header.push(String::new());
        header.push(self.formatter.style_text(
            "Enter=select  ↑/↓=move  e/c/m/r/h=shortcut  Esc/q=cancel",
            Color::Color256(244),
        ));
        header
    }
}

impl ActionSurface for FullScreenSurface {
    fn present(&mut self, view: &CandidateView<'_>) -> Result<ActionOutcome> {
        let header = self.candidate_header(view);
        let items: Vec<String> = view
            .available
            .iter()
            .map(|action| format!("[{}] {}", action.hotkey(), action.label()))
            .collect();

        let outcome = match self.select(&header, &items, 0, &ActionOutcome::ALL)? {
            KeyResult::Chosen(i) => view
                .available
                .get(i)
                .copied()
                .unwrap_or(ActionOutcome::Cancel),
            KeyResult::Hotkey(action) => action,
            _ => ActionOutcome::Cancel,
        };

        // Leave the command visible on the normal screen.
        if outcome != ActionOutcome::Cancel && !view.command.is_empty() {
            eprintln!("{}", self.formatter.format_candidate(view.command, None));
        }
        Ok(outcome)
    }

    fn edit_command(&mut self, current: &str) -> Result<Option<String>> {
        prompt_text("Command", current)
    }

    fn refine_query(&mut self, current: &Query) -> Result<Option<String>> {
        prompt_text("Refine request", current.as_str())
    }

    fn choose_history(&mut self, entries: &[HistoryEntry]) -> Result<Option<usize>> {
        let header = vec![
            self.formatter.style_text("History", Color::Cyan),
            self.formatter.style_text(
                "Enter=use command  ↑/↓=move  Esc/q=back",
                Color::Color256(244),
            ),
        ];
        let items = history_labels(&self.formatter, entries);

        match self.select(&header, &items, entries.len().saturating_sub(1), &[])? {
            KeyResult::Chosen(i) => Ok(Some(i)),
            _ => Ok(None),
        }
    }

    fn notify(&mut self, notice: Notice) {
        render_notice(&self.formatter, notice);
    }
}

fn handle_key_input(
    key: KeyEvent,
    selected: &mut usize,
    items_len: usize,
    hotkeys: &[ActionOutcome],
) -> KeyResult {
    // Windows reports releases too.
    if key.kind != KeyEventKind::Press {
        return KeyResult::Ignored;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => KeyResult::Dismissed,
            _ => KeyResult::Ignored,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            *selected = selected.saturating_sub(1);
            KeyResult::Moved
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *selected + 1 < items_len {
                *selected += 1;
            }
            KeyResult::Moved
        }
        KeyCode::Enter if items_len > 0 => KeyResult::Chosen(*selected),
        KeyCode::Esc | KeyCode::Char('q') => KeyResult::Dismissed,
        KeyCode::Char(c) => hotkeys
            .iter()
            .find(|action| action.hotkey() == c.to_ascii_lowercase())
            .map(|action| KeyResult::Hotkey(*action))
            .unwrap_or(KeyResult::Ignored),
        _ => KeyResult::Ignored,
    }
}
