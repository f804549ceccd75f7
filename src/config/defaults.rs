use crate::config::Settings;

pub struct DefaultConfig;

impl DefaultConfig {
    /// Commented template printed by `--print-default-config`.
    pub fn create_default_config_file() -> String {
        r#"# oneliner configuration

[credentials]
# api_key = "..."        # GEMINI_API_KEY takes precedence

[output]
# default_style = "auto" # auto | interactive | plain
use_colors = true

[model]
name = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta"
temperature = 0.2
request_timeout_secs = 30

[history]
max_entries = 100
record_copies = false

[execution]
# timeout_secs = 60      # unset: commands run to completion

[setup]
max_attempts = 1
"#
        .to_string()
    }

    pub fn get_default_settings() -> Settings {
        Settings::default()
    }
}
