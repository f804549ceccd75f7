use clap::Parser;

use crate::config::StyleChoice;

#[derive(Parser, Debug)]
#[command(name = "oneliner")]
#[command(about = "Turn a plain-language request into a shell command")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("ONELINER_TARGET"), ")"))]
pub struct Cli {
    /// What you want to do, in your own words
    pub query: Vec<String>,

    /// How to present the result: auto, interactive (tui) or plain (inline)
    #[arg(short, long, value_name = "STYLE", value_parser = parse_style)]
    pub style: Option<StyleChoice>,

    /// Run the generated command without showing a menu
    #[arg(short, long, conflicts_with = "copy")]
    pub execute: bool,

    /// Copy the generated command without showing a menu
    #[arg(short, long)]
    pub copy: bool,

    /// Use this API key instead of the environment or config file
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Stop an executed command after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Ignore values saved in the config file
    #[arg(long)]
    pub ignore_default: bool,

    /// Print the config file path and exit
    #[arg(long)]
    pub show_config_path: bool,

    /// Delete the config file and exit
    #[arg(long)]
    pub clear_config: bool,

    /// Do not ask for confirmation
    #[arg(short, long, requires = "clear_config")]
    pub yes: bool,

    /// Save the default presentation style and exit
    #[arg(long, value_name = "STYLE", value_parser = parse_style)]
    pub set_default_output: Option<StyleChoice>,

    /// Print a commented default config file and exit
    #[arg(long)]
    pub print_default_config: bool,

    /// Print previously generated commands and exit
    #[arg(long)]
    pub history: bool,

    /// Delete the command history and exit
    #[arg(long)]
    pub clear_history: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// One-shot actions that do not generate a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoAction {
    ShowConfigPath,
    ClearConfig { confirmed: bool },
    SetDefaultOutput(StyleChoice),
    PrintDefaultConfig,
    ShowHistory,
    ClearHistory,
}

impl Cli {
    /// Query words joined with single spaces; `None` when nothing was typed.
    pub fn query_text(&self) -> Option<String> {
        let text = self
            .query
            .iter()
            .map(|word| word.trim())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }

    pub fn info_action(&self) -> Option<InfoAction> {
        if self.show_config_path {
            Some(InfoAction::ShowConfigPath)
        } else if self.clear_config {
            Some(InfoAction::ClearConfig {
                confirmed: self.yes,
            })
        } else if let Some(style) = self.set_default_output {
            Some(InfoAction::SetDefaultOutput(style))
        } else if self.print_default_config {
            Some(InfoAction::PrintDefaultConfig)
        } else if self.history {
            Some(InfoAction::ShowHistory)
        } else if self.clear_history {
            Some(InfoAction::ClearHistory)
        } else {
            None
        }
    }
}

fn parse_style(value: &str) -> Result<StyleChoice, String> {
    value.parse::<StyleChoice>().map_err(|e| e.to_string())
}
