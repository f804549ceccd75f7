use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm};
use log::{debug, info};
use std::io::{self, IsTerminal};
use std::time::Duration;

use crate::ai::{CommandGenerator, GeminiClient, Query, Resolution};
use crate::cli::actions::{
    ActionController, ActionOutcome, ActionPolicy, InteractionReport, Regenerate,
};
use crate::cli::args::InfoAction;
use crate::cli::output::{OutputFormatter, Spinner};
use crate::cli::screen::FullScreenSurface;
use crate::cli::setup::TerminalSetup;
use crate::cli::surface::{ActionSurface, NonInteractiveSurface, PlainSurface};
use crate::config::{
    acquire_credential, ConfigFile, ConfigKey, ConfigStore, Credential, CredentialResolver,
    DefaultConfig, PresentationMode, PresentationResolver, Settings, StyleChoice,
};
use crate::context::{storage, HistoryStore};
use crate::error::BackendError;
use crate::utils::{EnvironmentDetector, PlatformContext, SystemClipboard, SystemShell};

/// Per-invocation choices taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub style: Option<StyleChoice>,
    pub execute: bool,
    pub copy: bool,
    pub api_key: Option<String>,
    pub timeout: Option<u64>,
}

impl QueryOptions {
    fn planned_action(&self) -> Option<ActionOutcome> {
        if self.execute {
            Some(ActionOutcome::Execute)
        } else if self.copy {
            Some(ActionOutcome::Copy)
        } else {
            None
        }
    }
}

pub struct CommandHandler {
    config: ConfigFile,
    history: HistoryStore,
    formatter: OutputFormatter,
}

/// Generation with everything resolved up front; also serves refinements.
struct Pipeline<'a> {
    generator: &'a CommandGenerator<GeminiClient>,
    platform: &'a PlatformContext,
    credential: &'a Credential,
}

#[async_trait]
impl Regenerate for Pipeline<'_> {
    async fn regenerate(&self, query: &Query) -> Result<Resolution, BackendError> {
        let spinner = Spinner::new("Thinking...");
        let result = self
            .generator
            .generate(query, self.platform, self.credential)
            .await;
        spinner.stop();
        result
    }
}

impl CommandHandler {
    pub fn new(ignore_persisted: bool) -> Result<Self> {
        let path = Settings::config_path()?;
        let mut config = ConfigFile::open(path, ignore_persisted);
        let formatter = OutputFormatter::new(config.settings().output.use_colors);

        if let Some(warning) = config.take_warning() {
            eprintln!("{}", formatter.format_warning(&warning));
        }

        let history = HistoryStore::in_data_dir(config.settings().history.max_entries)
            .context("Failed to locate history file")?;

        Ok(Self {
            config,
            history,
            formatter,
        })
    }

    pub fn handle_info(&mut self, action: InfoAction) -> Result<String> {
        match action {
            InfoAction::ShowConfigPath => Ok(self.config.path().display().to_string()),
            InfoAction::ClearConfig { confirmed } => self.handle_clear_config(confirmed),
            InfoAction::SetDefaultOutput(style) => {
                self.config
                    .set(ConfigKey::OutputStyle, style.as_str())
                    .context("Failed to save default output style")?;
                Ok(self.formatter.format_success(&format!(
                    "Default output style set to {}",
                    style.as_str()
                )))
            }
            InfoAction::PrintDefaultConfig => Ok(DefaultConfig::create_default_config_file()),
            InfoAction::ShowHistory => {
                let loaded = self.history.load();
                if let Some(warning) = &loaded.warning {
                    eprintln!("{}", self.formatter.format_warning(warning));
                }
                Ok(self.formatter.format_history(&loaded.entries))
            }
            InfoAction::ClearHistory => {
                self.history.clear().context("Failed to clear history")?;
                Ok(self.formatter.format_success("History cleared"))
            }
        }
    }

    fn handle_clear_config(&mut self, confirmed: bool) -> Result<String> {
        let path = self.config.path().to_path_buf();
        if !path.exists() {
            return Ok(self
                .formatter
                .format_info(&format!("No config file at {}", path.display())));
        }

        if !confirmed {
            if !io::stdin().is_terminal() {
                bail!("Refusing to delete the config file without confirmation; pass --yes");
            }
            let proceed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Delete {}?", path.display()))
                .default(false)
                .interact()?;
            if !proceed {
                return Ok(self.formatter.format_info("Config file kept"));
            }
        }

        storage::remove_if_exists(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        info!("Removed config file {}", path.display());
        Ok(self
            .formatter
            .format_success(&format!("Removed {}", path.display())))
    }

    /// Full flow for one request: credential, presentation, generation, then
    /// the action loop.
    pub async fn handle_query(
        &mut self,
        text: &str,
        options: QueryOptions,
    ) -> Result<InteractionReport> {
        let query = Query::new(text)?;
        let settings = self.config.settings().clone();

        let resolver = CredentialResolver::from_process(options.api_key.clone());
        let mut setup = TerminalSetup::new(self.formatter);
        let credential = acquire_credential(
            &resolver,
            &mut self.config,
            &mut setup,
            settings.setup.max_attempts,
        )?;
        debug!("Using API key {credential} from {:?}", credential.source());

        let decision = PresentationResolver::detect()
            .resolve(options.style.and_then(StyleChoice::mode), &self.config);
        if let Some(warning) = &decision.warning {
            eprintln!("{}", self.formatter.format_warning(warning));
        }
        debug!("Presentation mode: {}", decision.mode);

        let platform = EnvironmentDetector::new().detect_platform();
        debug!("Platform: {platform}");

        let generator = CommandGenerator::new(GeminiClient::new(&settings.model)?);
        let pipeline = Pipeline {
            generator: &generator,
            platform: &platform,
            credential: &credential,
        };

        let resolution = pipeline
            .regenerate(&query)
            .await
            .map_err(|e| backend_failure(&e))?;

        let mut surface = self.surface_for(decision.mode, &options);
        let executor = SystemShell::default();
        let mut clipboard = SystemClipboard::new();
        let policy = ActionPolicy {
            record_copies: settings.history.record_copies,
            timeout: options
                .timeout
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .or_else(|| settings.execution_timeout()),
        };

        let mut controller = ActionController::new(
            surface.as_mut(),
            &executor,
            &mut clipboard,
            &self.history,
            &pipeline,
            policy,
        );
        controller
            .run(query, resolution)
            .await
            .map_err(|e| backend_failure(&e))
    }

    fn surface_for(
        &self,
        mode: PresentationMode,
        options: &QueryOptions,
    ) -> Box<dyn ActionSurface> {
        let planned = options.planned_action();
        if planned.is_some() || !io::stdin().is_terminal() {
            return Box::new(NonInteractiveSurface::new(self.formatter, planned));
        }

        match mode {
            PresentationMode::Interactive => Box::new(FullScreenSurface::new(self.formatter)),
            PresentationMode::Plain => Box::new(PlainSurface::new(self.formatter)),
        }
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}

fn backend_failure(e: &BackendError) -> anyhow::Error {
    anyhow!("{e}\n{}", e.hint())
}
