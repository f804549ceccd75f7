use console::{Color, Term};
use dialoguer::{theme::ColorfulTheme, Password};
use log::debug;

use crate::cli::output::OutputFormatter;
use crate::config::credentials::API_KEY_ENV_VAR;
use crate::config::{CredentialSetup, SetupResult};

const KEY_PAGE: &str = "https://aistudio.google.com/app/apikey";

/// First-run prompt for the API key. Without a terminal on stdin the setup
/// counts as cancelled.
pub struct TerminalSetup {
    formatter: OutputFormatter,
}

impl TerminalSetup {
    pub fn new(formatter: OutputFormatter) -> Self {
        Self { formatter }
    }
}

impl CredentialSetup for TerminalSetup {
    fn prompt_for_credential(&mut self) -> SetupResult {
        eprintln!("{}", self.formatter.format_info("No Gemini API key found."));
        eprintln!(
            "Create one at {} or set {}.",
            self.formatter.style_text(KEY_PAGE, Color::Cyan),
            API_KEY_ENV_VAR
        );

        if !Term::stdout().is_term() && !Term::stderr().is_term() {
            debug!("No terminal available for API key setup");
            return SetupResult::Cancelled;
        }

        let entry = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Gemini API key")
            .allow_empty_password(true)
            .interact();
        setup_result(entry)
    }
}

/// A blank entry is still an entry, so the caller may ask again. Only a
/// failed or aborted prompt cancels setup.
fn setup_result(entry: dialoguer::Result<String>) -> SetupResult {
    match entry {
        Ok(key) => SetupResult::Entered(key.trim().to_string()),
        Err(e) => {
            debug!("API key prompt failed: {e}");
            SetupResult::Cancelled
        }
    }
}
