use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;

use crate::ai::{Query, Resolution};
use crate::cli::surface::{ActionSurface, CandidateView, Notice};
use crate::context::{HistoryEntry, HistoryStore};
use crate::error::BackendError;
use crate::utils::{ClipboardSink, ExecutionOutcome, ShellExecutor};

/// What the user can do with a candidate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Execute,
    Copy,
    Modify,
    Refine,
    ViewHistory,
    Cancel,
}

impl ActionOutcome {
    pub const ALL: [ActionOutcome; 6] = [
        ActionOutcome::Execute,
        ActionOutcome::Copy,
        ActionOutcome::Modify,
        ActionOutcome::Refine,
        ActionOutcome::ViewHistory,
        ActionOutcome::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActionOutcome::Execute => "Execute",
            ActionOutcome::Copy => "Copy to clipboard",
            ActionOutcome::Modify => "Modify command",
            ActionOutcome::Refine => "Refine request",
            ActionOutcome::ViewHistory => "View history",
            ActionOutcome::Cancel => "Cancel",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            ActionOutcome::Execute => 'e',
            ActionOutcome::Copy => 'c',
            ActionOutcome::Modify => 'm',
            ActionOutcome::Refine => 'r',
            ActionOutcome::ViewHistory => 'h',
            ActionOutcome::Cancel => 'q',
        }
    }

    pub fn needs_command(self) -> bool {
        matches!(self, ActionOutcome::Execute | ActionOutcome::Copy)
    }

    /// Execute and copy are withheld while there is no command.
    pub fn available_for(command: &str) -> Vec<ActionOutcome> {
        Self::ALL
            .into_iter()
            .filter(|action| !(action.needs_command() && command.is_empty()))
            .collect()
    }
}

/// Re-runs generation for a refined query.
#[async_trait]
pub trait Regenerate: Send + Sync {
    async fn regenerate(&self, query: &Query) -> Result<Resolution, BackendError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionPolicy {
    /// Record a successful copy in history even without execution.
    pub record_copies: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    Executed(ExecutionOutcome),
    /// The shell itself could not be started.
    ExecutionFailed(String),
    Copied,
    CopyUnavailable,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct InteractionReport {
    /// Query and resolution that were active when the interaction ended.
    pub query: Query,
    pub resolution: Resolution,
    /// Candidate command at the end, including user edits.
    pub command: String,
    pub finish: Finish,
    pub refinements: usize,
}

enum State {
    Presenting,
    Executing,
    Copying,
    Modifying,
    Refining,
    Browsing,
    Terminal(Finish),
}

pub struct ActionController<'a> {
    surface: &'a mut dyn ActionSurface,
    executor: &'a dyn ShellExecutor,
    clipboard: &'a mut dyn ClipboardSink,
    history: &'a HistoryStore,
    regenerator: &'a dyn Regenerate,
    policy: ActionPolicy,
    /// The candidate came from the history browser rather than the model.
    recalled: bool,
}

impl<'a> ActionController<'a> {
    pub fn new(
        surface: &'a mut dyn ActionSurface,
        executor: &'a dyn ShellExecutor,
        clipboard: &'a mut dyn ClipboardSink,
        history: &'a HistoryStore,
        regenerator: &'a dyn Regenerate,
        policy: ActionPolicy,
    ) -> Self {
        Self {
            surface,
            executor,
            clipboard,
            history,
            regenerator,
            policy,
            recalled: false,
        }
    }

    /// Drives the interaction until a terminal action. Refinement loops here
    /// rather than recursing, one user-initiated step at a time. Only a
    /// backend failure during refinement is an error.
    pub async fn run(
        &mut self,
        query: Query,
        resolution: Resolution,
    ) -> Result<InteractionReport, BackendError> {
        let mut query = query;
        let mut resolution = resolution;
        let mut candidate = resolution.command().to_string();
        let mut refinements = 0;
        let mut state = State::Presenting;

        loop {
            state = match state {
                State::Presenting => self.present(&query, &resolution, &candidate),
                State::Executing => {
                    State::Terminal(self.execute(&query, &resolution, &candidate).await)
                }
                State::Copying => State::Terminal(self.copy(&query, &resolution, &candidate)),
                State::Modifying => {
                    if let Some(edited) = self.modify(&candidate) {
                        candidate = edited;
                    }
                    State::Presenting
                }
                State::Refining => {
                    if let Some((refined, fresh)) = self.refine(&query).await? {
                        query = refined;
                        candidate = fresh.command().to_string();
                        resolution = fresh;
                        self.recalled = false;
                        refinements += 1;
                    }
                    State::Presenting
                }
                State::Browsing => {
                    if let Some(command) = self.browse() {
                        candidate = command;
                        self.recalled = true;
                    }
                    State::Presenting
                }
                State::Terminal(finish) => {
                    debug!("Interaction finished: {finish:?}");
                    return Ok(InteractionReport {
                        query,
                        resolution,
                        command: candidate,
                        finish,
                        refinements,
                    });
                }
            };
        }
    }

    fn present(&mut self, query: &Query, resolution: &Resolution, candidate: &str) -> State {
        let available = ActionOutcome::available_for(candidate);
        // An edited or recalled command no longer matches the explanation.
        let explanation = if candidate == resolution.command() || !resolution.has_command() {
            resolution.explanation()
        } else {
            None
        };
        let view = CandidateView {
            query,
            command: candidate,
            explanation,
            available: &available,
        };

        let action = match self.surface.present(&view) {
            Ok(action) => action,
            Err(e) => {
                warn!("Action menu failed: {e}");
                self.surface
                    .notify(Notice::Warning(format!("Interactive menu unavailable: {e}")));
                if !candidate.is_empty() {
                    self.surface.notify(Notice::ShowCommand(candidate.to_string()));
                }
                ActionOutcome::Cancel
            }
        };

        if action.needs_command() && candidate.is_empty() {
            self.surface.notify(Notice::Warning(format!(
                "No command generated; nothing to {}.",
                action.label().to_lowercase()
            )));
            return State::Presenting;
        }

        match action {
            ActionOutcome::Execute => State::Executing,
            ActionOutcome::Copy => State::Copying,
            ActionOutcome::Modify => State::Modifying,
            ActionOutcome::Refine => State::Refining,
            ActionOutcome::ViewHistory => State::Browsing,
            ActionOutcome::Cancel => State::Terminal(Finish::Cancelled),
        }
    }

    async fn execute(&mut self, query: &Query, resolution: &Resolution, command: &str) -> Finish {
        info!("Executing: {command}");
        self.surface.notify(Notice::Info(format!("Running: {command}")));

        let finish = match self.executor.run(command, self.policy.timeout).await {
            Ok(outcome) => {
                self.surface.notify(Notice::Execution(outcome.clone()));
                Finish::Executed(outcome)
            }
            Err(e) => {
                self.surface.notify(Notice::Error(e.to_string()));
                Finish::ExecutionFailed(e.to_string())
            }
        };

        self.record(query, resolution, command);
        finish
    }

    fn copy(&mut self, query: &Query, resolution: &Resolution, command: &str) -> Finish {
        match self.clipboard.copy(command) {
            Ok(()) => {
                self.surface
                    .notify(Notice::Success("Command copied to clipboard".to_string()));
                if self.policy.record_copies {
                    self.record(query, resolution, command);
                }
                Finish::Copied
            }
            Err(e) => {
                warn!("{e}");
                self.surface.notify(Notice::Warning(format!(
                    "{e}. Copy the command manually:"
                )));
                self.surface.notify(Notice::ShowCommand(command.to_string()));
                Finish::CopyUnavailable
            }
        }
    }

    fn modify(&mut self, current: &str) -> Option<String> {
        match self.surface.edit_command(current) {
            Ok(Some(edited)) if !edited.trim().is_empty() => Some(edited.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("Editing failed: {e}");
                self.surface
                    .notify(Notice::Warning(format!("Could not edit command: {e}")));
                None
            }
        }
    }

    async fn refine(
        &mut self,
        current: &Query,
    ) -> Result<Option<(Query, Resolution)>, BackendError> {
        let text = match self.surface.refine_query(current) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Refine prompt failed: {e}");
                self.surface
                    .notify(Notice::Warning(format!("Could not read refined request: {e}")));
                return Ok(None);
            }
        };

        let Ok(refined) = Query::new(&text) else {
            self.surface
                .notify(Notice::Info("Empty request; keeping the current command.".into()));
            return Ok(None);
        };

        info!("Refining request: {refined}");
        let fresh = self.regenerator.regenerate(&refined).await?;
        Ok(Some((refined, fresh)))
    }

    fn browse(&mut self) -> Option<String> {
        let loaded = self.history.load();
        if let Some(warning) = loaded.warning {
            self.surface.notify(Notice::Warning(warning));
        }
        let entries = loaded.entries;
        if entries.is_empty() {
            self.surface.notify(Notice::Info("No history yet.".to_string()));
            return None;
        }

        match self.surface.choose_history(&entries) {
            Ok(Some(index)) => entries.get(index).map(|entry| entry.command.clone()),
            Ok(None) => None,
            Err(e) => {
                warn!("History browser failed: {e}");
                self.surface
                    .notify(Notice::Warning(format!("Could not show history: {e}")));
                None
            }
        }
    }

    /// History keeps what the model generated for the query, even after an
    /// edit. A recalled command is recorded as run, and a user-typed command
    /// only when the model produced none.
    fn record(&mut self, query: &Query, resolution: &Resolution, command: &str) {
        let recorded = if resolution.has_command() && !self.recalled {
            resolution.command()
        } else {
            command
        };
        if recorded.is_empty() {
            return;
        }

        if let Err(e) = self.history.append(HistoryEntry::new(query.as_str(), recorded)) {
            warn!("Failed to save history: {e}");
            self.surface
                .notify(Notice::Warning(format!("Could not save history: {e}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClipboardError, ExecutionError};
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct ScriptedSurface {
        actions: VecDeque<ActionOutcome>,
        edits: VecDeque<Option<String>>,
        refines: VecDeque<Option<String>>,
        history_picks: VecDeque<Option<usize>>,
        fail_present: bool,
        seen_commands: Vec<String>,
        seen_available: Vec<Vec<ActionOutcome>>,
        notices: Vec<Notice>,
    }

    impl ScriptedSurface {
        fn with_actions(actions: &[ActionOutcome]) -> Self {
            Self {
                actions: actions.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn warnings(&self) -> usize {
            self.notices
                .iter()
                .filter(|n| matches!(n, Notice::Warning(_)))
                .count()
        }
    }

    impl ActionSurface for ScriptedSurface {
        fn present(&mut self, view: &CandidateView<'_>) -> anyhow::Result<ActionOutcome> {
            if self.fail_present {
                return Err(anyhow!("no terminal"));
            }
            self.seen_commands.push(view.command.to_string());
            self.seen_available.push(view.available.to_vec());
            Ok(self.actions.pop_front().unwrap_or(ActionOutcome::Cancel))
        }

        fn edit_command(&mut self, _current: &str) -> anyhow::Result<Option<String>> {
            Ok(self.edits.pop_front().flatten())
        }

        fn refine_query(&mut self, _current: &Query) -> anyhow::Result<Option<String>> {
            Ok(self.refines.pop_front().flatten())
        }

        fn choose_history(&mut self, _entries: &[HistoryEntry]) -> anyhow::Result<Option<usize>> {
            Ok(self.history_picks.pop_front().flatten())
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    struct FakeExecutor {
        outcome: ExecutionOutcome,
        ran: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        fn exiting(code: i32, stderr: &str) -> Self {
            Self {
                outcome: ExecutionOutcome::Completed {
                    exit_code: code,
                    stdout: Vec::new(),
                    stderr: stderr.as_bytes().to_vec(),
                },
                ran: Mutex::new(Vec::new()),
            }
        }

        fn ran(&self) -> Vec<String> {
            self.ran.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShellExecutor for FakeExecutor {
        async fn run(
            &self,
            command: &str,
            _timeout: Option<Duration>,
        ) -> Result<ExecutionOutcome, ExecutionError> {
            self.ran.lock().unwrap().push(command.to_string());
            Ok(self.outcome.clone())
        }
    }

    struct FakeClipboard {
        available: bool,
        copied: Vec<String>,
    }

    impl ClipboardSink for FakeClipboard {
        fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
            if !self.available {
                return Err(ClipboardError::Unavailable("no display".into()));
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    struct FakeRegenerator {
        reply: Result<Resolution, BackendError>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeRegenerator {
        fn replying(reply: Result<Resolution, BackendError>) -> Self {
            Self {
                reply,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Regenerate for FakeRegenerator {
        async fn regenerate(&self, query: &Query) -> Result<Resolution, BackendError> {
            self.queries.lock().unwrap().push(query.as_str().to_string());
            self.reply.clone()
        }
    }

    struct Harness {
        _dir: TempDir,
        history: HistoryStore,
        executor: FakeExecutor,
        clipboard: FakeClipboard,
        regenerator: FakeRegenerator,
        policy: ActionPolicy,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let history = HistoryStore::new(dir.path().join("history.json"), 100);
            Self {
                _dir: dir,
                history,
                executor: FakeExecutor::exiting(0, ""),
                clipboard: FakeClipboard {
                    available: true,
                    copied: Vec::new(),
                },
                regenerator: FakeRegenerator::replying(Ok(Resolution::new("true", None, "true"))),
                policy: ActionPolicy::default(),
            }
        }

        async fn run(
            &mut self,
            surface: &mut ScriptedSurface,
            query: &Query,
            resolution: &Resolution,
        ) -> Result<InteractionReport, BackendError> {
            let mut controller = ActionController::new(
                surface,
                &self.executor,
                &mut self.clipboard,
                &self.history,
                &self.regenerator,
                self.policy,
            );
            controller.run(query.clone(), resolution.clone()).await
        }
    }

    fn query(text: &str) -> Query {
        Query::new(text).unwrap()
    }

    #[tokio::test]
    async fn failing_command_is_reported_and_original_command_recorded() {
        let mut harness = Harness::new();
        harness.executor = FakeExecutor::exiting(127, "sh: badcmd: not found");
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::Modify,
            ActionOutcome::Execute,
        ]);
        surface.edits.push_back(Some("badcmd --verbose".into()));
        let q = query("run the thing");
        let resolution = Resolution::new("badcmd", None, "badcmd");

        let report = harness.run(&mut surface, &q, &resolution).await.unwrap();

        match &report.finish {
            Finish::Executed(ExecutionOutcome::Completed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(*exit_code, 127);
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected finish {other:?}"),
        }
        assert_eq!(harness.executor.ran(), vec!["badcmd --verbose"]);
        assert_eq!(report.command, "badcmd --verbose");
        assert_eq!(
            harness.history.load_all(),
            vec![HistoryEntry::new("run the thing", "badcmd")]
        );
        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Execution(o) if !o.success())));
    }

    #[tokio::test]
    async fn modify_does_not_touch_the_resolution() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Modify]);
        surface.edits.push_back(Some("  ls -lh  ".into()));
        let resolution = Resolution::new("ls", None, "ls");

        let report = harness
            .run(&mut surface, &query("list"), &resolution)
            .await
            .unwrap();

        assert_eq!(surface.seen_commands, vec!["ls", "ls -lh"]);
        assert_eq!(report.resolution, resolution);
        assert_eq!(report.finish, Finish::Cancelled);
        assert!(harness.executor.ran().is_empty());
    }

    #[tokio::test]
    async fn empty_command_blocks_execute_and_copy() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::Execute,
            ActionOutcome::Copy,
            ActionOutcome::Cancel,
        ]);
        let resolution = Resolution::new("", Some("cannot help".into()), "cannot help");

        let report = harness
            .run(&mut surface, &query("impossible"), &resolution)
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::Cancelled);
        assert_eq!(surface.warnings(), 2);
        assert!(harness.executor.ran().is_empty());
        assert!(harness.clipboard.copied.is_empty());
        assert!(harness.history.load_all().is_empty());
        for available in &surface.seen_available {
            assert!(!available.contains(&ActionOutcome::Execute));
            assert!(!available.contains(&ActionOutcome::Copy));
            assert!(available.contains(&ActionOutcome::Refine));
        }
    }

    #[tokio::test]
    async fn refine_replaces_active_values_without_mutating_originals() {
        let mut harness = Harness::new();
        harness.regenerator = FakeRegenerator::replying(Ok(Resolution::new(
            "ls -la ~/Downloads",
            Some("Downloads listing".into()),
            "raw",
        )));
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::Refine,
            ActionOutcome::Cancel,
        ]);
        surface.refines.push_back(Some("list files in Downloads".into()));

        let original_query = query("list files");
        let original_resolution = Resolution::new("ls", None, "ls");
        let query_before = original_query.clone();
        let resolution_before = original_resolution.clone();

        let report = harness
            .run(&mut surface, &original_query, &original_resolution)
            .await
            .unwrap();

        assert_eq!(original_query, query_before);
        assert_eq!(original_resolution, resolution_before);
        assert_eq!(report.query.as_str(), "list files in Downloads");
        assert_eq!(report.resolution.command(), "ls -la ~/Downloads");
        assert_eq!(report.refinements, 1);
        assert_eq!(surface.seen_commands, vec!["ls", "ls -la ~/Downloads"]);
        assert_eq!(
            *harness.regenerator.queries.lock().unwrap(),
            vec!["list files in Downloads"]
        );
        assert!(harness.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn blank_refinement_keeps_current_command() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Refine]);
        surface.refines.push_back(Some("   ".into()));

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("pwd", None, "pwd"))
            .await
            .unwrap();

        assert_eq!(report.refinements, 0);
        assert!(harness.regenerator.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_during_refine_is_propagated() {
        let mut harness = Harness::new();
        harness.regenerator =
            FakeRegenerator::replying(Err(BackendError::Unavailable("offline".into())));
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Refine]);
        surface.refines.push_back(Some("again".into()));

        let err = harness
            .run(&mut surface, &query("q"), &Resolution::new("pwd", None, "pwd"))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Unavailable("offline".into()));
    }

    #[tokio::test]
    async fn executed_history_pick_is_recorded_as_run() {
        let mut harness = Harness::new();
        harness
            .history
            .append(HistoryEntry::new("old", "git status"))
            .unwrap();
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::ViewHistory,
            ActionOutcome::Execute,
        ]);
        surface.history_picks.push_back(Some(0));

        let report = harness
            .run(&mut surface, &query("new"), &Resolution::new("git log", None, "x"))
            .await
            .unwrap();

        assert_eq!(harness.executor.ran(), vec!["git status"]);
        assert_eq!(report.command, "git status");
        assert_eq!(surface.seen_commands, vec!["git log", "git status"]);
        assert_eq!(
            harness.history.load_all().last(),
            Some(&HistoryEntry::new("new", "git status"))
        );
    }

    #[tokio::test]
    async fn refining_after_a_history_pick_records_the_model_command() {
        let mut harness = Harness::new();
        harness
            .history
            .append(HistoryEntry::new("old", "git status"))
            .unwrap();
        harness.regenerator =
            FakeRegenerator::replying(Ok(Resolution::new("git log -3", None, "x")));
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::ViewHistory,
            ActionOutcome::Refine,
            ActionOutcome::Execute,
        ]);
        surface.history_picks.push_back(Some(0));
        surface.refines.push_back(Some("last three commits".into()));

        harness
            .run(&mut surface, &query("new"), &Resolution::new("git log", None, "x"))
            .await
            .unwrap();

        assert_eq!(
            harness.history.load_all().last(),
            Some(&HistoryEntry::new("last three commits", "git log -3"))
        );
    }

    #[tokio::test]
    async fn corrupt_history_is_reported_when_browsing() {
        let mut harness = Harness::new();
        std::fs::write(harness.history.path(), "{ not json").unwrap();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::ViewHistory]);

        harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Warning(msg) if msg.contains("corrupt"))));
        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Info(msg) if msg.contains("No history"))));
    }

    #[tokio::test]
    async fn empty_history_loops_back_with_notice() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::ViewHistory]);

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::Cancelled);
        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Info(msg) if msg.contains("No history"))));
    }

    #[tokio::test]
    async fn copy_is_not_recorded_by_default() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Copy]);

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::Copied);
        assert_eq!(harness.clipboard.copied, vec!["ls"]);
        assert!(harness.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn copy_recorded_when_policy_allows() {
        let mut harness = Harness::new();
        harness.policy.record_copies = true;
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Copy]);

        harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(harness.history.load_all(), vec![HistoryEntry::new("q", "ls")]);
    }

    #[tokio::test]
    async fn unavailable_clipboard_warns_and_shows_command() {
        let mut harness = Harness::new();
        harness.clipboard.available = false;
        harness.policy.record_copies = true;
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Copy]);

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::CopyUnavailable);
        assert_eq!(surface.warnings(), 1);
        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::ShowCommand(c) if c == "ls")));
        assert!(harness.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn cancel_has_no_side_effects() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[ActionOutcome::Cancel]);

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::Cancelled);
        assert!(harness.executor.ran().is_empty());
        assert!(harness.clipboard.copied.is_empty());
        assert!(harness.history.load_all().is_empty());
    }

    #[tokio::test]
    async fn broken_surface_falls_back_to_cancel() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface {
            fail_present: true,
            ..ScriptedSurface::default()
        };

        let report = harness
            .run(&mut surface, &query("q"), &Resolution::new("ls", None, "ls"))
            .await
            .unwrap();

        assert_eq!(report.finish, Finish::Cancelled);
        assert!(surface
            .notices
            .iter()
            .any(|n| matches!(n, Notice::ShowCommand(c) if c == "ls")));
    }

    #[tokio::test]
    async fn user_typed_command_recorded_when_model_gave_none() {
        let mut harness = Harness::new();
        let mut surface = ScriptedSurface::with_actions(&[
            ActionOutcome::Modify,
            ActionOutcome::Execute,
        ]);
        surface.edits.push_back(Some("uptime".into()));

        harness
            .run(&mut surface, &query("load"), &Resolution::new("", None, "??"))
            .await
            .unwrap();

        assert_eq!(harness.executor.ran(), vec!["uptime"]);
        assert_eq!(harness.history.load_all(), vec![HistoryEntry::new("load", "uptime")]);
    }

    #[test]
    fn available_actions_depend_on_command() {
        assert_eq!(ActionOutcome::available_for("ls"), ActionOutcome::ALL.to_vec());
        assert_eq!(
            ActionOutcome::available_for(""),
            vec![
                ActionOutcome::Modify,
                ActionOutcome::Refine,
                ActionOutcome::ViewHistory,
                ActionOutcome::Cancel
            ]
        );
    }
}
